//! TypeScript Support
//!
//! The TypeScript track runs the same harness as the JavaScript one; both the
//! test file and the learner's code are type-stripped first. There is no type
//! checking: a program that would not type-check still runs.
//!
//! # What gets rewritten
//!
//! - Type annotations, return types, `as`/`satisfies` and `!` assertions
//! - Interfaces, type aliases, `declare` statements, `import type`
//! - Generic parameters and call-site type arguments
//! - Access modifiers, abstract members and overload signatures
//! - Enums (to a `var` and an initializing IIFE)
//! - Constructor parameter properties (to `this.x = x` assignments)
//!
//! Namespaces are rejected with a transpile error.
//!
//! # Example
//!
//! ```
//! use playground_runner::typescript::transpile;
//!
//! let js = transpile("export const twoFer = (name: string = 'you'): string => `One for ${name}`;").unwrap();
//! assert_eq!(js, "export const twoFer = (name = 'you') => `One for ${name}`;");
//! ```

mod transpiler;

pub use transpiler::TypeScriptTranspiler;

use crate::error::Result;

/// Strip TypeScript from `source`, keeping its line structure.
pub fn transpile(source: &str) -> Result<String> {
    let _span = tracing::debug_span!("transpile", bytes = source.len()).entered();
    let js = TypeScriptTranspiler::new().transpile(source)?;
    tracing::trace!(bytes = js.len(), "transpiled");
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpile_keeps_plain_javascript() {
        let source = "export function square(x) {\n  return x * x;\n}\n";
        assert_eq!(transpile(source).unwrap(), source);
    }

    #[test]
    fn test_transpile_typical_exercise() {
        let source = r#"export type Resistor = 'black' | 'brown';

export const COLORS: Resistor[] = ['black', 'brown'];

export function colorCode(color: Resistor): number {
  return COLORS.indexOf(color);
}
"#;
        let js = transpile(source).unwrap();
        assert!(js.contains("export const COLORS = ['black', 'brown'];"));
        assert!(js.contains("export function colorCode(color) {"));
        assert!(!js.contains("Resistor"));
        assert_eq!(js.lines().count(), source.lines().count());
    }

    #[test]
    fn test_transpile_error_carries_offset() {
        let err = transpile("const a = 1;\nenum E { A = (1, }").unwrap_err();
        assert!(err.is_source_error());
        assert!(err.to_string().starts_with("TranspileError:"));
    }
}
