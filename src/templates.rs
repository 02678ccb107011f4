//! HTML templates rendered with minijinja
//!
//! Templates are compiled once at startup. Names ending in `.html` get HTML
//! autoescaping, so every interpolated value is escaped.

use minijinja::Environment;

pub const INDEX_TEMPLATE: &str = "index.html";

const INDEX_SOURCE: &str = include_str!("../templates/index.html");

/// Build the template environment with all page templates registered
pub fn create_environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(INDEX_TEMPLATE, INDEX_SOURCE)?;
    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_compiles_index() {
        let env = create_environment().unwrap();
        assert!(env.get_template(INDEX_TEMPLATE).is_ok());
    }
}
