use std::io::{self, Write};
use std::sync::Arc;
use taskset_tool::{
    Color, FileStore, NO_THRESHOLD, StoreConfig, Task, TaskSet, TaskSetListener, TaskSetRegistry,
    load_task_set_from_csv, load_task_set_from_json, save_task_set_to_csv, save_task_set_to_json,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

struct AnnounceChanges;

impl TaskSetListener for AnnounceChanges {
    fn on_task_set_added(&self, task_set: &Arc<TaskSet>) {
        println!("Registered task set '{}'.", task_set.name());
    }

    fn on_task_set_removed(&self, task_set: &Arc<TaskSet>) {
        println!("Removed task set '{}'.", task_set.name());
    }

    fn on_task_sets_reloaded(&self) {
        println!("Task sets reloaded.");
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn render_task_set(task_set: &TaskSet) -> String {
    let mut out = format!("Task set '{}' ({} tasks)\n", task_set.name(), task_set.len());
    out.push_str(&format!(
        "{:<16} {:>7} {:>9} {:>12} {:>9} {:>10} {:>7}  {}\n",
        "name", "period", "deadline", "computation", "priority", "threshold", "offset", "color"
    ));
    for task in task_set.tasks() {
        let threshold = task
            .threshold()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<16} {:>7} {:>9} {:>12} {:>9} {:>10} {:>7}  {}\n",
            task.name(),
            task.period(),
            task.deadline(),
            task.computation(),
            task.priority(),
            threshold,
            task.offset(),
            task.color()
        ));
    }
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  sets                               List task sets in registration order\n  new <set>                          Register an empty task set and select it\n  use <set>                          Select an existing task set\n  show                               Show the selected task set\n  add <task> <period> <deadline> <computation> <priority> [threshold|-] [offset] [#RRGGBB]\n                                     Insert or replace a task in the selected set\n  remove <task>                      Remove a task from the selected set\n  drop <set>                         Remove a task set from the registry\n  save                               Persist all task sets\n  reload                             Discard changes and load the persisted task sets\n  dump                               Print the encoded registry\n  export <json|csv> <path>           Write the selected set to a file\n  import json <path>                 Register a task set read from JSON\n  import csv <path> <set>            Register a task set read from CSV under <set>\n  quit|exit                          Exit"
    );
}

fn parse_i32(value: &str, what: &str) -> Result<i32, String> {
    value.parse::<i32>().map_err(|_| format!("Invalid {what}"))
}

fn parse_task(name: &str, args: &[&str]) -> Result<Task, String> {
    let period = parse_i32(args[0], "period")?;
    let deadline = parse_i32(args[1], "deadline")?;
    let computation = parse_i32(args[2], "computation")?;
    let priority = parse_i32(args[3], "priority")?;
    let threshold = match args.get(4) {
        None | Some(&"-") => NO_THRESHOLD,
        Some(value) => parse_i32(value, "threshold")?,
    };
    let offset = match args.get(5) {
        Some(value) => parse_i32(value, "offset")?,
        None => 0,
    };
    let color = match args.get(6) {
        Some(value) => value.parse::<Color>().map_err(|e| e.to_string())?,
        None => Color::default(),
    };
    Task::new(
        name,
        color.argb(),
        offset,
        period,
        deadline,
        computation,
        priority,
        threshold,
    )
    .map_err(|e| format!("Error: {e}"))
}

fn main() {
    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Could not read configuration: {e}");
            StoreConfig::default()
        }
    };
    init_tracing(&config.log_filter);

    let store_path = config.task_sets_path();
    let registry = TaskSetRegistry::open(FileStore::new(&store_path));
    registry.add_listener(Arc::new(AnnounceChanges));
    let mut selected: Option<Arc<TaskSet>> = None;

    println!("Task Set Tool (CLI) - type 'help' for commands");
    println!(
        "{} task set(s) loaded from {}\n",
        registry.len(),
        store_path.display()
    );

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts[0];
        let args = &parts[1..];

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "sets" => {
                let names = registry.names();
                if names.is_empty() {
                    println!("No task sets.");
                }
                for (index, name) in names.iter().enumerate() {
                    println!("  {index}: {name}");
                }
            }
            "new" => match args {
                [name] => {
                    if registry.contains(name) {
                        println!("Task set '{name}' already exists.");
                        continue;
                    }
                    selected = Some(registry.register(TaskSet::new(*name)));
                }
                _ => println!("Usage: new <set>"),
            },
            "use" => match args {
                [name] => match registry.get(name) {
                    Some(set) => {
                        println!("Selected task set '{name}'.");
                        selected = Some(set);
                    }
                    None => println!("Task set '{name}' not found."),
                },
                _ => println!("Usage: use <set>"),
            },
            "show" => match &selected {
                Some(set) => print!("{}", render_task_set(set)),
                None => println!("No task set selected."),
            },
            "add" => {
                if args.len() < 5 || args.len() > 8 {
                    println!(
                        "Usage: add <task> <period> <deadline> <computation> <priority> [threshold|-] [offset] [#RRGGBB]"
                    );
                    continue;
                }
                let Some(set) = &selected else {
                    println!("No task set selected.");
                    continue;
                };
                match parse_task(args[0], &args[1..]) {
                    Ok(task) => {
                        let name = task.name().to_string();
                        match set.put(task) {
                            Some(_) => println!("Task '{name}' replaced."),
                            None => println!("Task '{name}' added."),
                        }
                    }
                    Err(message) => println!("{message}"),
                }
            }
            "remove" => match (args, &selected) {
                ([name], Some(set)) => match set.remove(name) {
                    Some(_) => println!("Task '{name}' removed."),
                    None => println!("Task '{name}' not found."),
                },
                ([_], None) => println!("No task set selected."),
                _ => println!("Usage: remove <task>"),
            },
            "drop" => match args {
                [name] => {
                    let removed = registry
                        .get(name)
                        .is_some_and(|set| registry.remove(&set));
                    if !removed {
                        println!("Task set '{name}' not found.");
                    } else if selected.as_ref().is_some_and(|set| set.name() == *name) {
                        selected = None;
                    }
                }
                _ => println!("Usage: drop <set>"),
            },
            "save" => match registry.write() {
                Ok(()) => println!("Saved {} task set(s) to {}", registry.len(), store_path.display()),
                Err(e) => println!("Save error: {e}"),
            },
            "reload" => match registry.reload() {
                Ok(()) => {
                    selected = selected.and_then(|set| registry.get(set.name()));
                }
                Err(e) => println!("Reload error: {e}"),
            },
            "dump" => match registry.marshalled() {
                Ok(text) => println!("{text}"),
                Err(e) => println!("Error: {e}"),
            },
            "export" => match (args, &selected) {
                ([format, path], Some(set)) => {
                    let result = match *format {
                        "json" => save_task_set_to_json(set, path),
                        "csv" => save_task_set_to_csv(set, path),
                        _ => {
                            println!("Unknown format '{format}' (json|csv)");
                            continue;
                        }
                    };
                    match result {
                        Ok(()) => println!("Task set exported to {path}"),
                        Err(e) => println!("Export error: {e}"),
                    }
                }
                ([_, _], None) => println!("No task set selected."),
                _ => println!("Usage: export <json|csv> <path>"),
            },
            "import" => {
                let loaded = match args {
                    ["json", path] => load_task_set_from_json(path),
                    ["csv", path, name] => load_task_set_from_csv(path, *name),
                    _ => {
                        println!("Usage: import json <path> | import csv <path> <set>");
                        continue;
                    }
                };
                match loaded {
                    Ok(set) => selected = Some(registry.register(set)),
                    Err(e) => println!("Import error: {e}"),
                }
            }
            _ => println!("Unknown command '{cmd}'. Type 'help' for commands."),
        }
    }
}
