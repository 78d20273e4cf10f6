//! Pages without a backing store.

use super::Page;

/// Landing page.
#[derive(Debug, Default)]
pub struct DashboardPage;

impl Page for DashboardPage {
    fn title(&self) -> String {
        "Dashboard".to_string()
    }

    fn render(&self) -> String {
        "nzyme is watching the air. Pick a page from the navigation.".to_string()
    }
}

/// Alert detail page, addressed by alert id.
#[derive(Debug)]
pub struct AlertDetailsPage {
    id: String,
}

impl AlertDetailsPage {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Page for AlertDetailsPage {
    fn title(&self) -> String {
        format!("Alert {}", self.id)
    }

    fn render(&self) -> String {
        format!("Alert {}", self.id)
    }
}

/// Unknown route.
#[derive(Debug)]
pub struct NotFoundPage {
    path: String,
}

impl NotFoundPage {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Page for NotFoundPage {
    fn title(&self) -> String {
        "Not Found".to_string()
    }

    fn render(&self) -> String {
        format!("Page not found: {}", self.path)
    }
}
