use crate::support::{exit_with, print_json, registry_or_exit};
use dpp_classify::ClassificationTable;

pub fn run(config_dir: Option<String>, json_output: bool) {
    let registry = registry_or_exit(ClassificationTable::new(), config_dir.as_deref());
    let infos = registry
        .list_schemas()
        .into_iter()
        .map(|name| registry.info(name))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| exit_with(e));

    if json_output {
        print_json(&infos);
        return;
    }
    println!("dpp schemas");
    for info in infos {
        let aliases = if info.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", info.aliases.join(", "))
        };
        println!("  {} {}{aliases}", info.name, info.version);
    }
}
