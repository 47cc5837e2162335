/// Which movie, if any, is open in the detail view.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionController {
    current: Option<String>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle: selecting the open movie closes it, anything else switches to it.
    pub fn select(&mut self, id: &str) -> Option<&str> {
        if self.current.as_deref() == Some(id) {
            self.current = None;
        } else {
            self.current = Some(id.to_string());
        }
        self.current()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}
