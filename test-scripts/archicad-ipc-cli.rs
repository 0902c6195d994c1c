use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

use archicad_ipc::{
    join_elements, kill_archicad, parse_classification_date, start_archicad,
    ArchicadClientBlocking, ArchicadClientBlockingBuilder, ArchicadError, ElementFilter, ElementId,
    FlatValue, JoinMode, PropertyColumn, PropertyTable,
};

#[derive(Debug)]
struct CliConfig {
    host: Option<String>,
    port: Option<u16>,
    timeout_ms: u64,
}

#[derive(Debug, Default)]
struct ClassificationArgs {
    system: Option<String>,
    date: Option<String>,
    item: Option<String>,
}

#[derive(Debug)]
enum Command {
    Alive,
    ProductInfo,
    Properties {
        group: Vec<String>,
        case_sensitive: bool,
    },
    ClassificationSystems,
    FindClassification {
        classification: ClassificationArgs,
    },
    Elements {
        element_type: Option<String>,
        classification: ClassificationArgs,
        guids: Vec<String>,
        join: JoinMode,
    },
    Table {
        element_type: String,
        group: Vec<String>,
    },
    SetCell {
        element: String,
        column: String,
        value: String,
    },
    Launch {
        version: u32,
        file: Option<PathBuf>,
    },
    Kill {
        pid: u32,
    },
    Smoke,
    Help,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            if matches!(err, ArchicadError::ConnectorUnavailable { .. }) {
                eprintln!(
                    "hint: start ArchiCAD, open a project, and leave it idle before rerunning this command."
                );
            }
            if matches!(err, ArchicadError::MissingTemplate { .. }) {
                eprintln!(
                    "hint: no element had a value for this column; set it once in ArchiCAD so its type is known."
                );
            }
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<(), ArchicadError> {
    let (config, command) = parse_args()?;

    match &command {
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Launch { version, file } => {
            let launched = start_archicad(*version, file.as_deref())?;
            println!(
                "launched version={} file={} pid={}",
                launched.version,
                launched
                    .file_name
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "-".to_string()),
                launched.pid
            );
            return Ok(());
        }
        Command::Kill { pid } => {
            kill_archicad(*pid)?;
            println!("killed pid={pid}");
            return Ok(());
        }
        _ => {}
    }

    let mut builder =
        ArchicadClientBlockingBuilder::new().timeout(Duration::from_millis(config.timeout_ms));
    if let Some(host) = config.host {
        builder = builder.host(host);
    }
    if let Some(port) = config.port {
        builder = builder.port(port);
    }

    let client = builder.connect()?;

    match command {
        Command::Alive => {
            println!("alive={} endpoint={}", client.is_alive()?, client.endpoint());
        }
        Command::ProductInfo => {
            println!("{}", client.get_product_info()?);
        }
        Command::Properties {
            group,
            case_sensitive,
        } => {
            let group: Vec<&str> = group.iter().map(String::as_str).collect();
            let columns = client.find_properties_by_group(&group, case_sensitive)?;
            println!("properties={}", columns.len());
            for column in columns {
                println!("{column}");
            }
        }
        Command::ClassificationSystems => {
            for system in client.get_all_classification_systems()? {
                println!(
                    "guid={} name={} version={} date={}",
                    system.classification_system_id.guid, system.name, system.version, system.date
                );
            }
        }
        Command::FindClassification { classification } => {
            match resolve_classification(&client, &classification)? {
                Some(item) => println!("classification_item_guid={}", item.guid),
                None => println!("no matching classification item"),
            }
        }
        Command::Elements {
            element_type,
            classification,
            guids,
            join,
        } => {
            let mut filter = ElementFilter {
                element_type,
                classification: None,
            };
            if classification.item.is_some() {
                filter.classification = Some(
                    resolve_classification(&client, &classification)?.ok_or_else(|| {
                        ArchicadError::Config {
                            reason: "classification item not found".to_string(),
                        }
                    })?,
                );
            }

            let mut lists = Vec::new();
            if !filter.is_empty() {
                lists.push(client.elements(&filter)?);
            }
            if !guids.is_empty() {
                lists.push(guids.into_iter().map(ElementId::new).collect());
            }

            let elements = join_elements(join, &lists);
            println!("elements={}", elements.len());
            for element in elements {
                println!("{element}");
            }
        }
        Command::Table {
            element_type,
            group,
        } => {
            let elements = client.get_elements_by_type(&element_type)?;
            let group: Vec<&str> = group.iter().map(String::as_str).collect();
            let columns = client.find_properties_by_group(&group, true)?;
            let table = client.get_element_property_table(&elements, columns)?;
            print_table(&table);
        }
        Command::SetCell {
            element,
            column,
            value,
        } => {
            let element = ElementId::new(element);
            let column_id = PropertyColumn::from_str(&column)?;
            let mut table =
                client.get_element_property_table(std::slice::from_ref(&element), vec![column_id])?;
            println!("before={}", table.get(&element, &column)?);
            table.set(&element, &column, FlatValue::from(value))?;

            let summary = client.set_property_table(&table)?;
            println!(
                "submitted={} succeeded={} failed={}",
                summary.total(),
                summary.succeeded(),
                summary.failed()
            );
            for ((code, message), count) in &summary.outcomes {
                println!("code={code} message={message} count={count}");
            }
        }
        Command::Smoke => {
            let info = client.get_product_info()?;
            let systems = client.get_all_classification_systems()?;
            let properties = client.get_all_property_names()?;
            println!(
                "smoke ok: product=\"{info}\" classification_systems={} properties={}",
                systems.len(),
                properties.len()
            );
        }
        Command::Help | Command::Launch { .. } | Command::Kill { .. } => {}
    }

    Ok(())
}

fn resolve_classification(
    client: &ArchicadClientBlocking,
    args: &ClassificationArgs,
) -> Result<Option<archicad_ipc::ClassificationItemId>, ArchicadError> {
    let name = args.system.as_deref().ok_or_else(|| ArchicadError::Config {
        reason: "missing --system".to_string(),
    })?;
    let item = args.item.as_deref().ok_or_else(|| ArchicadError::Config {
        reason: "missing --item".to_string(),
    })?;
    let date = args
        .date
        .as_deref()
        .map(parse_classification_date)
        .transpose()?;

    let Some(system) = client.find_classification_system(name, date, false)? else {
        return Err(ArchicadError::Config {
            reason: format!("classification system `{name}` not found"),
        });
    };

    client.find_classification(&system.classification_system_id, item)
}

fn print_table(table: &PropertyTable) {
    println!("rows={} columns={}", table.len(), table.columns().len());
    for row in table.rows() {
        println!("[{}]", row.element_id);
        for (column, cell) in table.columns().iter().zip(&row.cells) {
            println!("  {column} = {cell}");
        }
    }
}

fn parse_args() -> Result<(CliConfig, Command), ArchicadError> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() {
        return Ok((default_config(), Command::Help));
    }

    let mut config = default_config();
    let mut index = 0;

    while index < args.len() {
        match args[index].as_str() {
            "--host" => {
                config.host = Some(option_value(&args, index, "--host")?.to_string());
                args.drain(index..=index + 1);
            }
            "--port" => {
                let value = option_value(&args, index, "--port")?;
                config.port = Some(value.parse::<u16>().map_err(|err| ArchicadError::Config {
                    reason: format!("invalid --port value `{value}`: {err}"),
                })?);
                args.drain(index..=index + 1);
            }
            "--timeout-ms" => {
                let value = option_value(&args, index, "--timeout-ms")?;
                config.timeout_ms = value.parse::<u64>().map_err(|err| ArchicadError::Config {
                    reason: format!("invalid --timeout-ms value `{value}`: {err}"),
                })?;
                args.drain(index..=index + 1);
            }
            _ => {
                index += 1;
            }
        }
    }

    if args.is_empty() {
        return Ok((config, Command::Help));
    }

    let options = &args[1..];
    let command = match args[0].as_str() {
        "help" | "--help" | "-h" => Command::Help,
        "alive" => Command::Alive,
        "product-info" => Command::ProductInfo,
        "properties" => Command::Properties {
            group: repeated(options, "--group")?,
            case_sensitive: !options.iter().any(|arg| arg == "--ignore-case"),
        },
        "classification-systems" => Command::ClassificationSystems,
        "find-classification" => Command::FindClassification {
            classification: classification_args(options)?,
        },
        "elements" => {
            let join = match single(options, "--join")? {
                Some(value) => {
                    JoinMode::from_str(&value).map_err(|reason| ArchicadError::Config { reason })?
                }
                None => JoinMode::Intersect,
            };
            Command::Elements {
                element_type: single(options, "--type")?,
                classification: classification_args(options)?,
                guids: repeated(options, "--guid")?,
                join,
            }
        }
        "table" => Command::Table {
            element_type: required(options, "--type")?,
            group: repeated(options, "--group")?,
        },
        "set-cell" => Command::SetCell {
            element: required(options, "--element")?,
            column: required(options, "--column")?,
            value: required(options, "--value")?,
        },
        "launch" => {
            let version = match single(options, "--version")? {
                Some(value) => value.parse::<u32>().map_err(|err| ArchicadError::Config {
                    reason: format!("invalid --version value `{value}`: {err}"),
                })?,
                None => 25,
            };
            Command::Launch {
                version,
                file: single(options, "--file")?.map(PathBuf::from),
            }
        }
        "kill" => {
            let value = required(options, "--pid")?;
            Command::Kill {
                pid: value.parse::<u32>().map_err(|err| ArchicadError::Config {
                    reason: format!("invalid --pid value `{value}`: {err}"),
                })?,
            }
        }
        "smoke" => Command::Smoke,
        other => {
            return Err(ArchicadError::Config {
                reason: format!("unknown command `{other}`"),
            });
        }
    };

    Ok((config, command))
}

fn option_value<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str, ArchicadError> {
    args.get(index + 1)
        .map(String::as_str)
        .ok_or_else(|| ArchicadError::Config {
            reason: format!("missing value for {flag}"),
        })
}

fn repeated(options: &[String], flag: &str) -> Result<Vec<String>, ArchicadError> {
    let mut values = Vec::new();
    let mut i = 0;
    while i < options.len() {
        if options[i] == flag {
            values.push(option_value(options, i, flag)?.to_string());
            i += 2;
            continue;
        }
        i += 1;
    }
    Ok(values)
}

fn single(options: &[String], flag: &str) -> Result<Option<String>, ArchicadError> {
    Ok(repeated(options, flag)?.pop())
}

fn required(options: &[String], flag: &str) -> Result<String, ArchicadError> {
    single(options, flag)?.ok_or_else(|| ArchicadError::Config {
        reason: format!("missing required {flag}"),
    })
}

fn classification_args(options: &[String]) -> Result<ClassificationArgs, ArchicadError> {
    Ok(ClassificationArgs {
        system: single(options, "--system")?,
        date: single(options, "--date")?,
        item: single(options, "--item")?,
    })
}

fn default_config() -> CliConfig {
    CliConfig {
        host: None,
        port: None,
        timeout_ms: 3_000,
    }
}

fn print_help() {
    println!(
        "archicad-ipc-cli\n\nUSAGE:\n  cargo run --features blocking --bin archicad-ipc-cli -- [--host HOST] [--port N] [--timeout-ms N] <command> [command options]\n\nCOMMANDS:\n  alive                                         Check the JSON API connection\n  product-info                                  Show version, build and language\n  properties [--group G]... [--ignore-case]     List property columns under a group path\n  classification-systems                        List classification systems\n  find-classification --system S [--date YYYY-MM-DD] --item ID\n                                                Resolve a classification item guid\n  elements [--type T] [--system S --item ID] [--guid G]... [--join intersect|union]\n                                                Query and join element ids\n  table --type T [--group G]...                 Print the property table of an element type\n  set-cell --element GUID --column COL --value V\n                                                Write one string cell back through the table\n  launch [--version N] [--file PATH]            Start ArchiCAD (macOS `open`)\n  kill --pid N                                  Stop a launched ArchiCAD process\n  smoke                                         product-info + classification + property counts\n  help                                          Show help\n\nCOLUMNS:\n  <group::path>>>><property::path>, e.g. \"Built-in Properties::General>>>Width\"\n"
    );
}
