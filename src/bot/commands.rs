//! Chat command parsing: prefix-gated line parser plus a declarative
//! positional-argument schema.
//!
//! Commands are plain text lines starting with the configured prefix
//! (default `\`). The first token is the command word, the rest are
//! positional arguments. Each command declares an ordered [`ArgSpec`] list
//! checked by one generic validator, so arity and integer parsing are
//! handled uniformly instead of per handler.
//!
//! The parser returns a [`Command`] for the handler to act on. Lines without
//! the prefix are not commands at all and yield `None` so ordinary chatter is
//! never answered.

use log::trace;
use thiserror::Error;

/// What a positional argument must parse as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgKind {
    Integer,
    Text,
}

/// One slot in a command's positional schema.
#[derive(Clone, Copy, Debug)]
pub struct ArgSpec {
    pub kind: ArgKind,
    pub required: bool,
}

impl ArgSpec {
    pub const fn required(kind: ArgKind) -> Self {
        Self { kind, required: true }
    }

    pub const fn optional(kind: ArgKind) -> Self {
        Self { kind, required: false }
    }
}

/// A validated positional argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgValue<'a> {
    Int(i64),
    Text(&'a str),
}

impl<'a> ArgValue<'a> {
    /// Integer value of this slot. Only called on positions the schema
    /// declares `Integer`, which `check_args` has already parsed.
    pub fn int(&self) -> i64 {
        match self {
            ArgValue::Int(v) => *v,
            ArgValue::Text(_) => 0,
        }
    }

    pub fn text(&self) -> &'a str {
        match self {
            ArgValue::Text(t) => t,
            ArgValue::Int(_) => "",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgError {
    #[error("expected at least {required} argument(s), got {got}")]
    Missing { required: usize, got: usize },
    #[error("argument {position} must be a number, got '{value}'")]
    NotInteger { position: usize, value: String },
}

/// Validate `args` against `schema`: arity first, then integer parsing for
/// every supplied position the schema declares `Integer`. Tokens beyond the
/// schema are ignored. Returns the parsed values on success.
pub fn check_args<'a>(args: &[&'a str], schema: &[ArgSpec]) -> Result<Vec<ArgValue<'a>>, ArgError> {
    let required = schema.iter().filter(|s| s.required).count();
    if args.len() < required {
        return Err(ArgError::Missing {
            required,
            got: args.len(),
        });
    }

    let mut values = Vec::with_capacity(schema.len().min(args.len()));
    for (position, (spec, raw)) in schema.iter().zip(args.iter()).enumerate() {
        match spec.kind {
            ArgKind::Integer => match raw.parse::<i64>() {
                Ok(v) => values.push(ArgValue::Int(v)),
                Err(_) => {
                    return Err(ArgError::NotInteger {
                        position,
                        value: (*raw).to_string(),
                    })
                }
            },
            ArgKind::Text => values.push(ArgValue::Text(raw)),
        }
    }
    Ok(values)
}

const ADDHOUSE_SCHEMA: &[ArgSpec] = &[
    ArgSpec::required(ArgKind::Text),    // district
    ArgSpec::required(ArgKind::Integer), // ward
    ArgSpec::required(ArgKind::Integer), // plot
    ArgSpec::required(ArgKind::Text),    // price
    ArgSpec::optional(ArgKind::Integer), // hours since first spotted
];
const DELHOUSE_SCHEMA: &[ArgSpec] = &[
    ArgSpec::required(ArgKind::Text),
    ArgSpec::required(ArgKind::Integer),
];
const ADDTODO_SCHEMA: &[ArgSpec] = &[ArgSpec::required(ArgKind::Text)];
const DELTODO_SCHEMA: &[ArgSpec] = &[ArgSpec::required(ArgKind::Integer)];
const ITEM_SCHEMA: &[ArgSpec] = &[ArgSpec::required(ArgKind::Text)];

pub const USAGE_ADDHOUSE: &str =
    "Usage: addhouse <district> <ward 0-21> <plot 0-60> <price> [hours-ago]";
pub const USAGE_DELHOUSE: &str = "Usage: delhouse <district> <index>";
pub const USAGE_ADDTODO: &str = "Usage: addtodo <what needs doing>";
pub const USAGE_DELTODO: &str = "Usage: deltodo <index>";
pub const USAGE_ITEM: &str = "Usage: item <item name>";

/// A parsed chat command, arguments already validated against the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddHouse {
        district: String,
        ward: i64,
        plot: i64,
        price: String,
        age_hours: i64,
    },
    GetHouses,
    DelHouse {
        district: String,
        index: i64,
    },
    RecoverHouse,
    AddTodo {
        message: String,
    },
    DelTodo {
        index: i64,
    },
    Todos {
        include_resolved: bool,
    },
    Item {
        query: String,
    },
    Help,
    /// Recognized command word, arguments failed validation.
    Invalid {
        usage: &'static str,
    },
    /// Prefixed line with an unrecognized command word.
    Unknown,
}

/// Minimal prefix-gated command parser.
pub struct CommandParser {
    prefix: char,
}

impl CommandParser {
    pub fn new(prefix: char) -> Self {
        Self { prefix }
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    /// Parse one chat line. `None` means the line is not addressed to the bot.
    pub fn parse(&self, raw: &str) -> Option<Command> {
        let trimmed = raw.trim();
        let body = trimmed.strip_prefix(self.prefix)?;
        let mut tokens = body.split_whitespace();
        let word = tokens.next()?;
        let args: Vec<&str> = tokens.collect();
        trace!("parsed command word '{word}' with {} arg(s)", args.len());

        let command = match word.to_ascii_lowercase().as_str() {
            "addhouse" => match check_args(&args, ADDHOUSE_SCHEMA) {
                Ok(vals) => Command::AddHouse {
                    district: vals[0].text().to_string(),
                    ward: vals[1].int(),
                    plot: vals[2].int(),
                    price: vals[3].text().to_string(),
                    age_hours: vals.get(4).map(ArgValue::int).unwrap_or(0),
                },
                Err(_) => Command::Invalid {
                    usage: USAGE_ADDHOUSE,
                },
            },
            "gethouses" => Command::GetHouses,
            "delhouse" => match check_args(&args, DELHOUSE_SCHEMA) {
                Ok(vals) => Command::DelHouse {
                    district: vals[0].text().to_string(),
                    index: vals[1].int(),
                },
                Err(_) => Command::Invalid {
                    usage: USAGE_DELHOUSE,
                },
            },
            "recoverhouse" => Command::RecoverHouse,
            "addtodo" => match check_args(&args, ADDTODO_SCHEMA) {
                Ok(_) => Command::AddTodo {
                    message: args.join(" "),
                },
                Err(_) => Command::Invalid {
                    usage: USAGE_ADDTODO,
                },
            },
            "deltodo" => match check_args(&args, DELTODO_SCHEMA) {
                Ok(vals) => Command::DelTodo {
                    index: vals[0].int(),
                },
                Err(_) => Command::Invalid {
                    usage: USAGE_DELTODO,
                },
            },
            "todos" => Command::Todos {
                include_resolved: !args.is_empty(),
            },
            "item" => match check_args(&args, ITEM_SCHEMA) {
                Ok(_) => Command::Item {
                    query: args.join(" "),
                },
                Err(_) => Command::Invalid { usage: USAGE_ITEM },
            },
            "help" => Command::Help,
            _ => Command::Unknown,
        };
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> CommandParser {
        CommandParser::new('\\')
    }

    #[test]
    fn ignores_unprefixed_lines() {
        assert_eq!(parser().parse("hello everyone"), None);
        assert_eq!(parser().parse(""), None);
        assert_eq!(parser().parse("\\"), None);
    }

    #[test]
    fn parses_addhouse_with_optional_offset() {
        let cmd = parser().parse("\\addhouse uldah 5 10 500k").expect("command");
        assert_eq!(
            cmd,
            Command::AddHouse {
                district: "uldah".into(),
                ward: 5,
                plot: 10,
                price: "500k".into(),
                age_hours: 0,
            }
        );

        let cmd = parser().parse("\\addhouse L 1 2 2.5m 3").expect("command");
        assert_eq!(
            cmd,
            Command::AddHouse {
                district: "L".into(),
                ward: 1,
                plot: 2,
                price: "2.5m".into(),
                age_hours: 3,
            }
        );
    }

    #[test]
    fn addhouse_arity_and_type_failures() {
        assert_eq!(
            parser().parse("\\addhouse uldah 5 10"),
            Some(Command::Invalid {
                usage: USAGE_ADDHOUSE
            })
        );
        assert_eq!(
            parser().parse("\\addhouse uldah five 10 500k"),
            Some(Command::Invalid {
                usage: USAGE_ADDHOUSE
            })
        );
    }

    #[test]
    fn addtodo_joins_free_text() {
        let cmd = parser().parse("\\addtodo water  the   garden").expect("command");
        assert_eq!(
            cmd,
            Command::AddTodo {
                message: "water the garden".into()
            }
        );
        assert_eq!(
            parser().parse("\\addtodo"),
            Some(Command::Invalid {
                usage: USAGE_ADDTODO
            })
        );
    }

    #[test]
    fn todos_flag_shows_resolved() {
        assert_eq!(
            parser().parse("\\todos"),
            Some(Command::Todos {
                include_resolved: false
            })
        );
        assert_eq!(
            parser().parse("\\todos all"),
            Some(Command::Todos {
                include_resolved: true
            })
        );
    }

    #[test]
    fn command_word_is_case_insensitive() {
        assert_eq!(parser().parse("\\GetHouses"), Some(Command::GetHouses));
        assert_eq!(parser().parse("\\RECOVERHOUSE"), Some(Command::RecoverHouse));
    }

    #[test]
    fn unknown_word_is_flagged() {
        assert_eq!(parser().parse("\\frobnicate"), Some(Command::Unknown));
    }

    #[test]
    fn alternate_prefix() {
        let p = CommandParser::new('!');
        assert_eq!(p.parse("!help"), Some(Command::Help));
        assert_eq!(p.parse("\\help"), None);
    }

    #[test]
    fn schema_checker_reports_structured_errors() {
        let schema = &[
            ArgSpec::required(ArgKind::Text),
            ArgSpec::required(ArgKind::Integer),
        ];
        assert_eq!(
            check_args(&["only"], schema),
            Err(ArgError::Missing {
                required: 2,
                got: 1
            })
        );
        assert_eq!(
            check_args(&["a", "b"], schema),
            Err(ArgError::NotInteger {
                position: 1,
                value: "b".into()
            })
        );
        let vals = check_args(&["a", "7", "extra"], schema).expect("ok");
        assert_eq!(vals, vec![ArgValue::Text("a"), ArgValue::Int(7)]);
    }
}
