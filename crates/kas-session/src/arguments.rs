//! Collecting the extra arguments of a predicate.
//!
//! Collection is all-or-nothing: either every prompt is answered and an
//! [`Event::InvokePredicate`] comes out, or the user cancels and no request
//! is ever sent.

use kas_protocol::ExplorerPredicate;

use crate::{Event, SessionError};

/// Prompt text shown for argument `index` of a predicate.
pub fn argument_prompt(index: usize, label: &str) -> String {
    format!("Enter {index}-th argument: ({label})")
}

/// Source of answers for argument prompts. `None` means the user cancelled.
pub trait ArgumentPrompter {
    fn prompt(&mut self, prompt: &str) -> Option<String>;
}

/// Stepwise collector for UIs that gather answers across several frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentCollector {
    predicate: ExplorerPredicate,
    collected: Vec<String>,
}

/// Outcome of starting or feeding a collector.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectStep {
    /// More answers are needed.
    Pending(ArgumentCollector),
    /// Every argument is present.
    Ready(Event),
}

impl ArgumentCollector {
    /// Begin collecting for `predicate`. Predicates without extra
    /// arguments are ready immediately.
    pub fn start(predicate: ExplorerPredicate) -> CollectStep {
        Self {
            predicate,
            collected: Vec::new(),
        }
        .step()
    }

    pub fn predicate_name(&self) -> &str {
        &self.predicate.name
    }

    /// Index of the argument being asked for.
    pub fn position(&self) -> usize {
        self.collected.len()
    }

    pub fn total(&self) -> usize {
        self.predicate.additional_args.len()
    }

    /// Text of the pending prompt.
    pub fn prompt(&self) -> String {
        let index = self.collected.len();
        let label = self
            .predicate
            .additional_args
            .get(index)
            .map(String::as_str)
            .unwrap_or_default();
        argument_prompt(index, label)
    }

    /// Record the answer to the pending prompt.
    pub fn supply(mut self, value: String) -> CollectStep {
        self.collected.push(value);
        self.step()
    }

    /// Abandon collection. Nothing is sent.
    pub fn cancel(self) -> SessionError {
        SessionError::ArgumentsCancelled(self.predicate.name)
    }

    fn step(self) -> CollectStep {
        if self.collected.len() >= self.predicate.additional_args.len() {
            CollectStep::Ready(Event::InvokePredicate {
                name: self.predicate.name,
                args: self.collected,
            })
        } else {
            CollectStep::Pending(self)
        }
    }
}

/// Ask `prompter` for every argument of `predicate` in order, stopping at the
/// first cancellation.
pub fn collect_arguments<P: ArgumentPrompter + ?Sized>(
    predicate: &ExplorerPredicate,
    prompter: &mut P,
) -> Result<Event, SessionError> {
    let mut step = ArgumentCollector::start(predicate.clone());
    loop {
        match step {
            CollectStep::Ready(event) => return Ok(event),
            CollectStep::Pending(collector) => match prompter.prompt(&collector.prompt()) {
                Some(value) => step = collector.supply(value),
                None => return Err(collector.cancel()),
            },
        }
    }
}
