use crate::models::{MessageEntry, MessageOption};

/// One bot utterance in a choreographed sequence: an optional scripted
/// pause, then the message. Pauses also cover the typing indicator the
/// widget shows while waiting.
#[derive(Debug, Clone)]
pub struct NarrationStep {
    pub pause_ms: u64,
    pub message: MessageEntry,
}

/// Ordered list of narration steps. Built up front by a transition
/// handler and played sequentially; the only suspension points of a
/// transition are these pauses and gateway awaits.
#[derive(Debug, Clone, Default)]
pub struct Narration {
    steps: Vec<NarrationStep>,
}

impl Narration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bot(self, text: &str) -> Self {
        self.bot_after(0, text)
    }

    pub fn bot_after(mut self, pause_ms: u64, text: &str) -> Self {
        self.steps.push(NarrationStep {
            pause_ms,
            message: MessageEntry::bot(text),
        });
        self
    }

    pub fn rich_after(mut self, pause_ms: u64, rich: String) -> Self {
        self.steps.push(NarrationStep {
            pause_ms,
            message: MessageEntry::bot_rich(rich),
        });
        self
    }

    pub fn options_after(
        mut self,
        pause_ms: u64,
        text: &str,
        options: Vec<MessageOption>,
    ) -> Self {
        self.steps.push(NarrationStep {
            pause_ms,
            message: MessageEntry::bot(text).with_options(options),
        });
        self
    }

    pub fn into_steps(self) -> Vec<NarrationStep> {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sender;

    #[test]
    fn builder_preserves_order_and_pauses() {
        let steps = Narration::new()
            .bot("first")
            .bot_after(500, "second")
            .options_after(1000, "pick one", vec![MessageOption::plain("a", "A")])
            .into_steps();

        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].pause_ms, 0);
        assert_eq!(steps[1].pause_ms, 500);
        assert_eq!(steps[2].pause_ms, 1000);
        assert!(steps.iter().all(|s| s.message.sender == Sender::Bot));
        assert!(!steps[0].message.is_rich_content);
        assert_eq!(
            steps[2].message.options.as_ref().map(|o| o.len()),
            Some(1)
        );
    }
}
