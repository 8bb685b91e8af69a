//! Output formatting

use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Print a single record; tables render it as key/value rows
    pub fn print<T: Serialize>(&self, data: &T) {
        match self {
            OutputFormat::Table => match serde_json::to_value(data) {
                Ok(Value::Object(map)) => {
                    let mut builder = Builder::default();
                    for (key, value) in map {
                        builder.push_record([key, cell(&value)]);
                    }
                    println!("{}", builder.build().with(Style::rounded()));
                }
                Ok(other) => println!("{}", cell(&other)),
                Err(e) => eprintln!("cannot render output: {}", e),
            },
            _ => self.print_serialized(data),
        }
    }

    /// Print a list; tables use the row type's columns
    pub fn print_rows<R: Tabled + Serialize>(&self, rows: &[R]) {
        match self {
            OutputFormat::Table => {
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
            _ => self.print_serialized(&rows),
        }
    }

    fn print_serialized<T: Serialize + ?Sized>(&self, data: &T) {
        let rendered = match self {
            OutputFormat::Yaml => serde_yaml::to_string(data).map_err(|e| e.to_string()),
            _ => serde_json::to_string_pretty(data).map_err(|e| e.to_string()),
        };
        match rendered {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("cannot render output: {}", e),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".into(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
