// src/cli/handlers/list_plugins.rs

use crate::plugins::PluginRegistry;
use colored::Colorize;

/// Prints every registered plugin with its one-line summary.
pub fn handle(registry: &PluginRegistry) {
    println!("{}", "Available plugins:".yellow().bold());
    for line in plugin_lines(registry) {
        println!("{}", line);
    }
}

fn plugin_lines(registry: &PluginRegistry) -> Vec<String> {
    let width = registry.iter().map(|p| p.name().len()).max().unwrap_or(0);
    registry
        .iter()
        .map(|plugin| format!("  {}  {}", format!("{:<width$}", plugin.name()).cyan(), plugin.summary()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_line_per_plugin_in_name_order() {
        colored::control::set_override(false);
        let registry = PluginRegistry::with_builtins();
        let lines = plugin_lines(&registry);

        assert_eq!(lines.len(), registry.iter().count());
        assert!(lines.first().unwrap().trim_start().starts_with("bootstrap"));
        assert!(lines.iter().any(|l| l.contains("valgrind") && l.ends_with("Run commands under valgrind")));
    }
}
