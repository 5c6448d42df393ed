// src/core/context.rs

//! The read-only state threaded through every resolution step.

use super::dispatcher::{DispatchError, DispatchResult};
use super::pattern::PatternsHandler;
use super::settings::SettingsNode;
use crate::models::FleetingOptions;
use crate::plugins::PluginRegistry;

/// Borrowed view of everything a resolution frame needs.
///
/// A new context is derived for each level of recursion with [`descend`](Self::descend);
/// nothing is pushed to or popped from shared state.
#[derive(Debug, Clone)]
pub struct ExecutionContext<'a> {
    options: &'a FleetingOptions,
    settings: &'a SettingsNode,
    patterns: &'a PatternsHandler,
    plugins: &'a PluginRegistry,
    /// Commands and plugins currently being resolved, outermost first.
    chain: Vec<String>,
    initial_command: Option<String>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        options: &'a FleetingOptions,
        settings: &'a SettingsNode,
        patterns: &'a PatternsHandler,
        plugins: &'a PluginRegistry,
    ) -> Self {
        Self {
            options,
            settings,
            patterns,
            plugins,
            chain: Vec::new(),
            initial_command: None,
        }
    }

    pub fn options(&self) -> &'a FleetingOptions {
        self.options
    }

    pub fn settings(&self) -> &'a SettingsNode {
        self.settings
    }

    pub fn patterns(&self) -> &'a PatternsHandler {
        self.patterns
    }

    pub fn plugins(&self) -> &'a PluginRegistry {
        self.plugins
    }

    /// The innermost settings-defined command, which scopes plugin settings.
    ///
    /// `None` at the top level, where a plugin is scoped to its own name.
    pub fn initial_command(&self) -> Option<&str> {
        self.initial_command.as_deref()
    }

    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    /// Derives the context used to resolve the sub-commands of `command`.
    ///
    /// Fails if `command` is already being resolved further up.
    pub fn descend(&self, command: &str) -> DispatchResult<Self> {
        let mut next = self.enter(command)?;
        next.initial_command = Some(command.to_string());
        Ok(next)
    }

    /// Derives the context a plugin runs in: `plugin` joins the chain, the scope stays.
    ///
    /// Fails if `plugin` is already running further up, e.g. valgrind wrapping itself.
    pub fn enter(&self, name: &str) -> DispatchResult<Self> {
        if self.chain.iter().any(|c| c == name) {
            let mut cycle = self.chain.clone();
            cycle.push(name.to_string());
            return Err(DispatchError::CyclicCommand(cycle));
        }
        let mut next = self.clone();
        next.chain.push(name.to_string());
        Ok(next)
    }

    /// Derives a context scoped to `command` without cycle tracking.
    ///
    /// Used by wrapping plugins that resolve further commands on behalf of their own command.
    pub fn scoped_to(&self, command: &str) -> Self {
        let mut next = self.clone();
        next.initial_command = Some(command.to_string());
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descend_tracks_initial_command_and_cycles() {
        let options = FleetingOptions::default();
        let settings = SettingsNode::new("exec-helper");
        let patterns = PatternsHandler::new();
        let plugins = PluginRegistry::new();
        let root = ExecutionContext::new(&options, &settings, &patterns, &plugins);
        assert_eq!(root.initial_command(), None);

        let all = root.descend("all").unwrap();
        let build = all.descend("build").unwrap();
        assert_eq!(build.initial_command(), Some("build"));
        assert_eq!(build.chain(), ["all", "build"]);
        // the parent frame is untouched
        assert_eq!(all.chain(), ["all"]);

        let wrapped = build.scoped_to("memcheck");
        assert_eq!(wrapped.initial_command(), Some("memcheck"));
        assert_eq!(wrapped.chain(), ["all", "build"]);

        let plugin = build.enter("valgrind").unwrap();
        assert_eq!(plugin.initial_command(), Some("build"));
        assert_eq!(plugin.chain(), ["all", "build", "valgrind"]);
        assert!(matches!(plugin.enter("valgrind"), Err(DispatchError::CyclicCommand(_))));

        match build.descend("all") {
            Err(DispatchError::CyclicCommand(cycle)) => assert_eq!(cycle, ["all", "build", "all"]),
            other => panic!("expected a cycle, got {:?}", other.map(|c| c.chain().to_vec())),
        }
    }
}
