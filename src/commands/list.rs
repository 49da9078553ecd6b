//! List commands implementation

use crate::backend;

/// List all compiled-in backends
pub fn list_backends() {
    let backends = backend::available_backends();
    if backends.is_empty() {
        println!("No backends available (recompile with backend features enabled)");
        return;
    }

    println!("Available backends:");
    println!();
    for b in &backends {
        println!("  {:10} - {}", b.name, b.description);
    }
}
