//! Command handling: routes parsed commands to the stores and renders every
//! outcome, success or failure, as a chat reply.
//!
//! This is the error boundary of the bot. Domain failures (bad district,
//! range violations, duplicates, bad indexes, empty recovery slot, malformed
//! arguments) become user-visible text; persistence failures are logged and
//! answered with a generic failure message while the in-memory state is kept.
//! Nothing propagates past [`CommandHandler::handle`] and nothing panics.

use anyhow::Result;
use log::{info, warn};

use crate::config::Config;
use crate::logutil::escape_log;
use crate::store::listings::{District, ListingError, ListingStore};
use crate::store::todos::{TodoError, TodoStore};
use crate::store::JsonSnapshot;

use super::commands::{Command, CommandParser};
use super::lookup::ItemLookup;

const DEFAULT_ERROR: &str = "Sorry, I didn't understand that. Try the help command.";
const GENERIC_FAILURE: &str = "Something went wrong saving that, please try again.";

/// Owns the stores and the lookup client; one inbound message is fully
/// processed (validated, mutated, persisted, replied) before the next.
pub struct CommandHandler {
    bot_name: String,
    parser: CommandParser,
    listings: ListingStore,
    todos: TodoStore,
    lookup: ItemLookup,
}

impl CommandHandler {
    pub fn new(config: &Config, listings: ListingStore, todos: TodoStore) -> Self {
        Self {
            bot_name: config.bot.name.clone(),
            parser: CommandParser::new(config.bot.prefix()),
            listings,
            todos,
            lookup: ItemLookup::new(config.lookup.clone()),
        }
    }

    /// Build a handler with durable JSON snapshots under the configured data
    /// directory.
    pub fn open(config: &Config) -> Result<Self> {
        let listings = ListingStore::open(Box::new(JsonSnapshot::new(config.storage.houses_path())))?;
        let todos = TodoStore::open(Box::new(JsonSnapshot::new(config.storage.todos_path())))?;
        Ok(Self::new(config, listings, todos))
    }

    pub fn listings(&self) -> &ListingStore {
        &self.listings
    }

    pub fn todos(&self) -> &TodoStore {
        &self.todos
    }

    /// Process one chat line from `sender`. `None` means the line was not
    /// addressed to the bot; otherwise the reply to send back.
    pub async fn handle(&mut self, sender: &str, raw: &str) -> Option<String> {
        let command = self.parser.parse(raw)?;
        info!("command from {sender}: {}", escape_log(raw));

        let reply = match command {
            Command::AddHouse {
                district,
                ward,
                plot,
                price,
                age_hours,
            } => match self.listings.add(&district, ward, plot, &price, age_hours) {
                Ok(resolved) => format!("Added! Now tracking a house in {resolved}."),
                Err(e) => listing_failure(e),
            },
            Command::GetHouses => match self.listings.render_all() {
                Ok(text) => text,
                Err(e) => listing_failure(e),
            },
            Command::DelHouse { district, index } => match usize::try_from(index) {
                Ok(index) => match self.listings.remove(&district, index) {
                    Ok((resolved, listing)) => format!(
                        "Removed house -> {resolved} - Ward {}, Plot {}. This can be recovered with {}recoverhouse",
                        listing.ward,
                        listing.plot,
                        self.parser.prefix()
                    ),
                    Err(e) => listing_failure(e),
                },
                Err(_) => format!("there is no listing {index} in {district}"),
            },
            Command::RecoverHouse => match self.listings.recover() {
                Ok(resolved) => format!("House recovered to the {resolved} listings."),
                Err(e) => listing_failure(e),
            },
            Command::AddTodo { message } => match self.todos.add(&message, sender) {
                Ok(()) => "To-Do added".to_string(),
                Err(e) => todo_failure(e),
            },
            Command::DelTodo { index } => match usize::try_from(index) {
                Ok(index) => match self.todos.resolve(index, sender) {
                    Ok(()) => "To-Do Completed!".to_string(),
                    Err(e) => todo_failure(e),
                },
                Err(_) => format!("there is no to-do number {index}"),
            },
            Command::Todos { include_resolved } => self.todos.render(include_resolved),
            Command::Item { query } => self.lookup.lookup(&query).await,
            Command::Help => self.help_text(),
            Command::Invalid { usage } => usage.to_string(),
            Command::Unknown => DEFAULT_ERROR.to_string(),
        };
        Some(reply)
    }

    fn help_text(&self) -> String {
        let p = self.parser.prefix();
        let mut out = format!("{} commands:\n", self.bot_name);
        out.push_str(&format!(
            "{p}addhouse <district> <ward> <plot> <price> [hours-ago] - track a house for sale\n"
        ));
        out.push_str(&format!("{p}gethouses - list tracked houses\n"));
        out.push_str(&format!(
            "{p}delhouse <district> <index> - remove a listing (recoverable)\n"
        ));
        out.push_str(&format!(
            "{p}recoverhouse - restore the most recently removed listing\n"
        ));
        out.push_str(&format!("{p}addtodo <text> - add a to-do\n"));
        out.push_str(&format!("{p}deltodo <index> - mark a to-do done\n"));
        out.push_str(&format!("{p}todos [all] - list to-dos\n"));
        out.push_str(&format!("{p}item <name> - look up an item\n"));
        let names: Vec<&str> = District::ALL.iter().map(|d| d.name()).collect();
        out.push_str(&format!(
            "Districts: {} (or just the first letter)",
            names.join(", ")
        ));
        out
    }
}

fn listing_failure(err: ListingError) -> String {
    match err {
        ListingError::Persist(e) => {
            warn!("listing snapshot write failed: {e}");
            GENERIC_FAILURE.to_string()
        }
        other => other.to_string(),
    }
}

fn todo_failure(err: TodoError) -> String {
    match err {
        TodoError::Persist(e) => {
            warn!("to-do snapshot write failed: {e}");
            GENERIC_FAILURE.to_string()
        }
        other => other.to_string(),
    }
}
