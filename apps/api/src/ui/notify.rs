//! Where failure messages go.

pub trait Notifier: Send {
    /// Shows `message` to the user. Called at most once per submission.
    fn alert(&mut self, message: &str);
}

/// CLI notifier: prints to stderr.
#[derive(Debug, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn alert(&mut self, message: &str) {
        eprintln!("error: {message}");
    }
}

/// Collects messages so a server-rendered page can show them in its alert slot.
#[derive(Debug, Default)]
pub struct PageAlert {
    messages: Vec<String>,
}

impl PageAlert {
    #[cfg(test)]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn last(&self) -> Option<&str> {
        self.messages.last().map(String::as_str)
    }
}

impl Notifier for PageAlert {
    fn alert(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}
