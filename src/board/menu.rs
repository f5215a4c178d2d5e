/// Card action menu state for one board.
/// At most one card menu is open; outside clicks and drag starts close it.
#[derive(Debug, Default)]
pub struct CardMenu {
    open_for: Option<String>,
}

impl CardMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_for(&self) -> Option<&str> {
        self.open_for.as_deref()
    }

    /// Clicking a card's menu button opens it, or closes it if already open
    pub fn toggle(&mut self, id: &str) {
        if self.open_for.as_deref() == Some(id) {
            self.open_for = None;
        } else {
            self.open_for = Some(id.to_string());
        }
    }

    pub fn outside_click(&mut self) {
        self.open_for = None;
    }

    pub fn drag_started(&mut self) {
        self.open_for = None;
    }
}
