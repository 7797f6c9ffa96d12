//! Evasion scripts evaluated after navigation.
//!
//! Listing pages gate lazy loading on a few automation checks; these hide
//! the most common headless tells. Failures are ignored.

pub const STEALTH_SCRIPTS: &[&str] = &[
    // navigator.webdriver is the first thing bot checks look at
    r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined,
        configurable: true
    });
    "#,
    r#"
    if (!window.chrome) {
        window.chrome = { runtime: {}, app: {} };
    }
    "#,
    r#"
    Object.defineProperty(navigator, 'languages', {
        get: () => ['ko-KR', 'ko', 'en-US', 'en'],
        configurable: true
    });
    "#,
];
