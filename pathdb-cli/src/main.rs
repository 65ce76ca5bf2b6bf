use clap::{Parser, Subcommand, ValueEnum};
use pathdb::persistence::{self, FileStorage};
use pathdb::{schema, Database};
use std::path::{Path, PathBuf};
use std::process;

/// PathDB CLI — inspect and edit a PathDB database file from the command line
#[derive(Parser)]
#[command(name = "pathdb", version, about)]
struct Cli {
    /// Path to the database file
    #[arg(long, env = "PATHDB_FILE", default_value = "db.json")]
    file: PathBuf,

    /// Output format
    #[arg(long, default_value = "yaml")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new, empty database file
    Create {
        /// Database name
        name: String,
        /// Unique field path (repeatable)
        #[arg(long = "unique")]
        unique: Vec<String>,
        /// Non-unique field path (repeatable)
        #[arg(long = "non-unique")]
        non_unique: Vec<String>,
        /// YAML file with `uniqueFields` / `nonUniqueFields`
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// Show the name, declared fields and row count
    Info,

    /// Rename the database
    Rename {
        /// New database name
        name: String,
    },

    /// Print the values of a declared field across all rows
    Column {
        /// Field path (e.g. profile/email)
        path: String,
    },

    /// Get the row whose unique field equals a value
    Get {
        /// Unique field path
        path: String,
        /// Value to match (parsed as JSON, else taken as a string)
        value: String,
    },

    /// Find every row whose non-unique field equals a value
    Find {
        /// Non-unique field path
        path: String,
        /// Value to match (parsed as JSON, else taken as a string)
        value: String,
    },

    /// Build a row from field values and append it
    Insert {
        /// Field values (e.g. --field username=james --field age=30)
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },

    /// Update fields of the row located by a unique field
    Set {
        /// Unique field path used to locate the row
        path: String,
        /// Value of that field
        value: String,
        /// Field values to write (e.g. --field age=31)
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let pos = s.find('=').ok_or_else(|| {
        format!("Invalid key=value pair: no '=' found in '{s}'")
    })?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let (storage, identifier) = split_file(&cli.file)?;

    match cli.command {
        Command::Create {
            name,
            unique,
            non_unique,
            schema: schema_file,
        } => {
            let (mut unique_fields, mut non_unique_fields) = match schema_file {
                Some(path) => {
                    let parsed = schema::parse_schema(&path)?;
                    (
                        parsed.unique_fields().to_vec(),
                        parsed.non_unique_fields().to_vec(),
                    )
                }
                None => (Vec::new(), Vec::new()),
            };
            unique_fields.extend(unique);
            non_unique_fields.extend(non_unique);

            let db = Database::create(name, unique_fields, non_unique_fields, Vec::new())?;
            persistence::save(&storage, &db, Some(&identifier))?;
            log::info!("Created database '{}' at {}", db.name(), cli.file.display());
            print_output(&info(&db), &cli.format)?;
        }

        Command::Info => {
            let db = persistence::open(&storage, &identifier)?;
            print_output(&info(&db), &cli.format)?;
        }

        Command::Rename { name } => {
            let mut db = persistence::open(&storage, &identifier)?;
            db.set_name(name);
            persistence::save(&storage, &db, Some(&identifier))?;
            print_output(&serde_json::json!({ "ok": true, "name": db.name() }), &cli.format)?;
        }

        Command::Column { path } => {
            let db = persistence::open(&storage, &identifier)?;
            let column = db.get_column(&path)?;
            print_output(&serde_json::json!(column), &cli.format)?;
        }

        Command::Get { path, value } => {
            let db = persistence::open(&storage, &identifier)?;
            let row = db.get_row_by_unique_field(&path, &parse_value(&value))?;
            print_output(&serde_json::json!(row), &cli.format)?;
        }

        Command::Find { path, value } => {
            let db = persistence::open(&storage, &identifier)?;
            let rows = db.get_rows_by_field(&path, &parse_value(&value))?;
            print_output(&serde_json::json!(rows), &cli.format)?;
        }

        Command::Insert { fields } => {
            let mut db = persistence::open(&storage, &identifier)?;
            let contents = fields
                .into_iter()
                .map(|(path, value)| {
                    let value = parse_value(&value);
                    (path, value)
                })
                .collect();
            let row = db.create_row(contents)?;
            db.append_row(row)?;
            persistence::save(&storage, &db, Some(&identifier))?;
            print_output(&serde_json::json!({ "ok": true, "rows": db.len() }), &cli.format)?;
        }

        Command::Set {
            path,
            value,
            fields,
        } => {
            let mut db = persistence::open(&storage, &identifier)?;
            let index = db
                .position_by_unique_field(&path, &parse_value(&value))?
                .ok_or_else(|| format!("No row with {path} = {value}"))?;

            for (field, raw) in fields {
                db.set_row_field(index, &field, parse_value(&raw))?;
            }

            persistence::save(&storage, &db, Some(&identifier))?;
            print_output(
                &serde_json::json!({ "ok": true, "row": db.rows().get(index) }),
                &cli.format,
            )?;
        }
    }

    Ok(())
}

/// Split `--file` into a storage rooted at its directory and the file name.
fn split_file(file: &Path) -> Result<(FileStorage, String), Box<dyn std::error::Error>> {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("Invalid database file: {}", file.display()))?
        .to_string();
    let dir = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((FileStorage::new(dir), name))
}

fn info(db: &Database) -> serde_json::Value {
    serde_json::json!({
        "name": db.name(),
        "uniqueFields": db.schema().unique_fields(),
        "nonUniqueFields": db.schema().non_unique_fields(),
        "rows": db.len(),
    })
}

/// Command-line values are JSON when they parse as JSON, plain strings otherwise.
fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

fn print_output(
    value: &serde_json::Value,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}
