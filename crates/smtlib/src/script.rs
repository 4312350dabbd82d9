use std::collections::BTreeSet;

use crate::command::Command;
use crate::formula::Formula;

/// An SMT-LIB script: a sequence of commands.
#[derive(Debug, Clone, Default)]
pub struct Script {
    commands: Vec<Command>,
}

impl Script {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn with_commands(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    /// Build a script asserting every formula, with the declarations of all
    /// their free variables hoisted to the top exactly once.
    pub fn from_assertions<'a>(assertions: impl IntoIterator<Item = &'a Formula>) -> Self {
        let assertions: Vec<&Formula> = assertions.into_iter().collect();
        let mut declared = BTreeSet::new();
        for formula in &assertions {
            declared.extend(formula.free_variables());
        }

        let mut script = Script::new();
        script.extend(
            declared
                .into_iter()
                .map(|(name, sort)| Command::DeclareConst(name, sort)),
        );
        script.extend(assertions.into_iter().cloned().map(Command::Assert));
        script
    }

    pub fn push(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    pub fn extend(&mut self, cmds: impl IntoIterator<Item = Command>) {
        self.commands.extend(cmds);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
