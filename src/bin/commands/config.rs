use sqlmanager::SqlManagerConfig;

use super::print_json;

pub fn run(config: &SqlManagerConfig, json_output: bool) {
    if json_output {
        print_json(
            &serde_json::json!({
                "config_file": SqlManagerConfig::config_file_path(),
                "database_path": config.database_path,
                "database_name": config.database_name,
                "table_name": config.table_name,
                "busy_timeout_secs": config.busy_timeout_secs,
                "read_only": config.read_only,
            }),
            true,
        );
        return;
    }

    println!("Config File:        {}", SqlManagerConfig::config_file_path());
    println!("{}", config.summary());
}
