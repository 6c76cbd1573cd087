use entrypay::Navigator;

pub mod initiate;
pub mod pending;
pub mod recover;
pub mod resolve;

/// Hands off by printing the gateway page for the payer to open
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn navigate(&self, url: &str) {
        println!("Open this page to pay the entry fee:\n{url}");
    }
}
