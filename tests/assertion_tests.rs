//! `expect` matchers and the deep-equality comparator, exercised through full runs

mod common;

use common::{run_completed, single_test};

fn passes(body: &str) {
    let result = run_completed(&single_test(body), "", "none");
    assert!(
        result.is_solved(),
        "expected pass for:\n{}\ngot: {:?}",
        body,
        result.messages
    );
}

fn fails_with(body: &str) -> String {
    let result = run_completed(&single_test(body), "", "none");
    assert_eq!(result.failed, 1, "expected failure for:\n{}", body);
    result.messages[0].details.clone().unwrap_or_default()
}

// ============================================================================
// Equality
// ============================================================================

#[test]
fn test_primitive_equality() {
    passes("expect(1 + 1).toBe(2); expect('a').toBe('a'); expect(NaN).toBe(NaN);");
    passes("expect(null).toBeNull(); expect(undefined).toBeUndefined();");
}

#[test]
fn test_deep_equality_of_structures() {
    passes("expect({ a: [1, { b: 2 }] }).toEqual({ a: [1, { b: 2 }] });");
    passes("expect([1, 2, 3]).toStrictEqual([1, 2, 3]);");
    passes("expect(new Date(5)).toEqual(new Date(5));");
    passes("expect(/ab+/g).toEqual(/ab+/g);");
    passes("expect(new Number(3)).toEqual(3);");
}

#[test]
fn test_deep_inequality() {
    passes("expect({ a: 1 }).not.toEqual({ a: 1, b: 2 });");
    passes("expect([1, 2]).not.toEqual({ 0: 1, 1: 2 });");
    passes("expect(/a/g).not.toEqual(/a/i);");
    passes("expect(0).not.toBe('0');");
}

#[test]
fn test_cyclic_structures_compare() {
    passes("const a = { n: 1 }; a.self = a; const b = { n: 1 }; b.self = b; expect(a).toEqual(b);");
}

#[test]
fn test_equality_failure_message() {
    assert_eq!(
        fails_with("expect([1, 2]).toEqual([1, 3]);"),
        "Expected [1,2] to equal [1,3]"
    );
    assert_eq!(
        fails_with("expect('one').toBe('two');"),
        "Expected \"one\" to be \"two\""
    );
}

// ============================================================================
// Other matchers
// ============================================================================

#[test]
fn test_numeric_matchers() {
    passes("expect(0.1 + 0.2).toBeCloseTo(0.3);");
    passes("expect(3).toBeGreaterThan(2); expect(3).toBeGreaterThanOrEqual(3);");
    passes("expect(1).toBeLessThan(2); expect(2).toBeLessThanOrEqual(2);");
    assert_eq!(
        fails_with("expect(1).toBeCloseTo(2);"),
        "Expected 1 to be close to 2"
    );
}

#[test]
fn test_truthiness_matchers() {
    passes("expect(1).toBeTruthy(); expect('').toBeFalsy(); expect(0).toBeDefined();");
}

#[test]
fn test_collection_matchers() {
    passes("expect([1, 2, 3]).toContain(2); expect('hello').toContain('ell');");
    passes("expect([1, 2]).not.toContain(3);");
    passes("expect([1, 2, 3]).toHaveLength(3); expect('ab').toHaveLength(2);");
    passes("expect('hello world').toMatch(/wor/); expect('abc').toMatch('b');");
}

#[test]
fn test_throw_matchers() {
    passes("expect(() => { throw new Error('bad input'); }).toThrow();");
    passes("expect(() => { throw new Error('bad input'); }).toThrow('bad');");
    passes("expect(() => { throw new TypeError('x'); }).toThrow(TypeError);");
    passes("expect(() => { throw new Error('bad input'); }).toThrow(/input$/);");
    passes("expect(() => 1).not.toThrow();");
    assert_eq!(fails_with("expect(() => 1).toThrow();"), "Expected function to throw");
}

#[test]
fn test_thrown_non_assertion_error_is_reported() {
    assert_eq!(
        fails_with("undefinedFunction();"),
        "undefinedFunction is not defined"
    );
}

// ============================================================================
// Equality properties
// ============================================================================

#[test]
fn test_equality_is_symmetric() {
    let setup = "const a = { x: 1 };\nconst b = { y: 2 };\nObject.defineProperty(b, 'x', { value: 1, enumerable: false });\n";
    passes(&format!("{}expect(a).not.toEqual(b);", setup));
    passes(&format!("{}expect(b).not.toEqual(a);", setup));
    passes("expect({ a: 1 }).not.toEqual({ a: 1, b: 2 }); expect({ a: 1, b: 2 }).not.toEqual({ a: 1 });");
    passes("expect([1, { b: 2 }]).toEqual([1, { b: 2 }]); expect(new Number(1)).toEqual(1); expect(1).toEqual(new Number(1));");
}

#[test]
fn test_arrays_of_different_length_are_unequal() {
    assert_eq!(
        fails_with("expect([1, 2]).toEqual([1, 2, 3]);"),
        "Expected [1,2] to equal [1,2,3]"
    );
    passes("expect([1, 2, 3]).not.toEqual([1, 2]);");
}

#[test]
fn test_symbol_keys_take_part_in_equality() {
    passes("const k = Symbol('k'); expect({ [k]: 1 }).toEqual({ [k]: 1 });");
    passes("const k = Symbol('k'); expect({ [k]: 1 }).not.toEqual({ [k]: 2 });");
    passes("const k = Symbol('k'); expect({ [k]: 1 }).not.toEqual({});");
}

#[test]
fn test_boxed_value_on_either_side() {
    passes("expect(3).toEqual(new Number(3)); expect(new String('a')).toEqual('a');");
    passes("expect(3).not.toEqual(new Number(4));");
}

// ============================================================================
// Async matchers and aliases
// ============================================================================

#[test]
fn test_rejects_fails_when_promise_resolves() {
    assert_eq!(
        fails_with("expect(Promise.resolve(1)).rejects.toThrow();"),
        "Expected error"
    );
    passes("expect(Promise.reject(new Error('no'))).rejects.toThrow();");
}

#[test]
fn test_skip_aliases_run_and_count() {
    let tests = "xtest('x', () => expect(1).toBe(1));\nxit('y', () => expect(2).toBe(2));";
    let result = run_completed(tests, "", "none");
    assert_eq!(result.passed, 2);
    assert_eq!(result.complete, Some(true));

    let failing = run_completed("xit('z', () => expect(1).toBe(2));", "", "none");
    assert_eq!(failing.failed, 1);
    assert_eq!(failing.complete, Some(false));
}
