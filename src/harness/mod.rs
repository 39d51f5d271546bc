//! Suite harness and assertion library injected into every test program
//!
//! The harness is plain JavaScript spliced into the test file after its
//! imports, so the assembled program is a single self-contained module with no
//! external resolution besides the learner module. It provides
//! `describe`/`test`/`it`/`xtest`/`xit` and `expect`, accumulates a run
//! aggregate, and exports it (`run`) together with a `__report()` function that
//! returns a JSON snapshot for the host.
//!
//! Host-provided knobs (fail-fast, console capture) reach the harness through a
//! realm prelude evaluated before any module is parsed, see [`prelude`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bumped whenever the injected source changes shape.
pub const HARNESS_VERSION: u32 = 1;

/// Name of the exported report function.
pub const REPORT_EXPORT: &str = "__report";

/// Global holding captured console entries.
pub const CONSOLE_GLOBAL: &str = "__playgroundConsole";

// ---------------------------------------------------------------------------
// Suite harness
// ---------------------------------------------------------------------------

/// `describe`/`test` state machine.
///
/// Tests run one after another through `__queue` in declaration order. The
/// `__awaiting` counter covers registered tests and open suites; whenever it
/// drops to zero the registered assertion promises are drained and
/// `run.complete` is set. A test only passes once every `resolves`/`rejects`
/// assertion it registered has settled successfully, awaited or not.
const SUITE_HARNESS: &str = r#"
const __run = {
  passed: 0,
  failed: 0,
  skipped: 0,
  complete: null,
  messages: [],
  promises: [],
};

const __options = globalThis.__playgroundOptions || {};
let __failFast = __options.failFast !== false;
let __awaiting = 0;
let __queue = Promise.resolve();
const __observed = new WeakSet();

function __errorText(err) {
  if (err instanceof Error) {
    return err.message;
  }
  return String(err);
}

function __startTest(name) {
  console.log('[test] ' + name);
}

function __passTest(name) {
  __run.passed += 1;
  __run.messages.push({ test: name, message: 'passed' });
}

function __failTest(name, err) {
  __run.failed += 1;
  __run.messages.push({ test: name, message: 'failed', details: __errorText(err) });

  if (err instanceof AssertionFailed) {
    console.error(`[test] failed assertion of ${name}.`, err.message);
  } else if (err instanceof SyntaxError) {
    __failFast = true;
    console.error('[test] syntax is not valid JavaScript', __errorText(err));
  } else {
    console.error(`[test] failed to run ${name}`, __errorText(err));
  }
}

function __skipTest(name) {
  __run.skipped += 1;
  console.log('[test] skipped ' + name);
}

function __claim(from) {
  const claimed = __run.promises.slice(from).filter((p) => !__observed.has(p));
  claimed.forEach((p) => __observed.add(p));
  return claimed;
}

async function __drain(name) {
  let seen = 0;
  while (seen < __run.promises.length) {
    const from = seen;
    seen = __run.promises.length;
    const outcomes = await Promise.allSettled(__claim(from));
    for (const outcome of outcomes) {
      if (outcome.status === 'rejected') {
        __failTest(name, outcome.reason);
      }
    }
  }
}

async function __finish() {
  await __drain('assertions outside a test');
  if (__awaiting === 0) {
    __run.complete = __run.failed === 0;
  }
}

function __settle() {
  __awaiting -= 1;
  if (__awaiting > 0) {
    return;
  }
  __finish();
}

async function __execute(name, body) {
  if (__failFast && __run.failed > 0) {
    __skipTest(name);
    return;
  }

  __startTest(name);

  const registered = __run.promises.length;
  try {
    await body();
    await Promise.all(__claim(registered));
    __passTest(name);
  } catch (err) {
    __claim(registered);
    __failTest(name, err);
  }
}

function test(name, body) {
  __awaiting += 1;
  const done = __queue.then(() => __execute(name, body)).finally(__settle);
  __queue = done;
  return done;
}

const xtest = test;
const it = test;
const xit = test;

async function describe(name, body) {
  __awaiting += 1;
  console.log('[suite] ' + name);

  try {
    await body();
  } catch (err) {
    __failTest(name, err);
  }

  await __queue;
  await __drain(name);

  if (__awaiting > 1) {
    console.log('[suite] still running');
  }
  __settle();
}

function __report() {
  return JSON.stringify({
    passed: __run.passed,
    failed: __run.failed,
    skipped: __run.skipped,
    complete: __run.complete,
    messages: __run.messages,
  });
}

export { __run as run, __report };
"#;

// ---------------------------------------------------------------------------
// Assertion library
// ---------------------------------------------------------------------------

/// `expect` and the deep-equality comparator behind `toBe`/`toEqual`/`toStrictEqual`.
const ASSERTIONS: &str = r#"
class AssertionFailed extends Error {
  constructor(message) {
    super(message);
    this.name = 'AssertionFailed';
  }
}

function __promise(p) {
  __run.promises.push(p);
  return p;
}

function __format(value) {
  switch (typeof value) {
    case 'string':
      return JSON.stringify(value);
    case 'bigint':
      return `${value}n`;
    case 'function':
      return `[Function ${value.name || 'anonymous'}]`;
    case 'object':
      break;
    default:
      return String(value);
  }
  if (value === null) {
    return 'null';
  }
  if (value instanceof Date) {
    return `Date(${value.getTime()})`;
  }
  if (value instanceof RegExp) {
    return String(value);
  }
  if (value instanceof Error) {
    return `${value.name}: ${value.message}`;
  }
  try {
    const json = JSON.stringify(value);
    if (json !== undefined) {
      return json;
    }
  } catch (_) {
    // cyclic
  }
  return Object.prototype.toString.call(value);
}

function __isBoxed(value) {
  return value instanceof Number || value instanceof String || value instanceof Boolean;
}

function __ownEnumerableKeys(value) {
  const keys = Object.keys(value);
  for (const symbol of Object.getOwnPropertySymbols(value)) {
    if (Object.prototype.propertyIsEnumerable.call(value, symbol)) {
      keys.push(symbol);
    }
  }
  return keys;
}

function __equals(a, b, stack = []) {
  if (a === b || Object.is(a, b)) {
    return true;
  }
  if (a === null || b === null || a === undefined || b === undefined) {
    return false;
  }
  if (__isBoxed(a) || __isBoxed(b)) {
    const left = __isBoxed(a) ? a.valueOf() : a;
    const right = __isBoxed(b) ? b.valueOf() : b;
    return left === right || Object.is(left, right);
  }
  if (typeof a !== 'object' || typeof b !== 'object') {
    return false;
  }
  if (a instanceof Date || b instanceof Date) {
    return a instanceof Date && b instanceof Date && Object.is(a.getTime(), b.getTime());
  }
  if (a instanceof RegExp || b instanceof RegExp) {
    return (
      a instanceof RegExp &&
      b instanceof RegExp &&
      a.source === b.source &&
      a.flags === b.flags
    );
  }
  if (Array.isArray(a) !== Array.isArray(b)) {
    return false;
  }

  for (const [left, right] of stack) {
    if (left === a && right === b) {
      return true;
    }
  }

  stack.push([a, b]);
  try {
    if (Array.isArray(a)) {
      if (a.length !== b.length) {
        return false;
      }
      for (let i = 0; i < a.length; i += 1) {
        if (!__equals(a[i], b[i], stack)) {
          return false;
        }
      }
      return true;
    }

    const keys = __ownEnumerableKeys(a);
    if (keys.length !== __ownEnumerableKeys(b).length) {
      return false;
    }
    for (const key of keys) {
      if (!Object.prototype.propertyIsEnumerable.call(b, key)) {
        return false;
      }
      if (!__equals(a[key], b[key], stack)) {
        return false;
      }
    }
    return true;
  } finally {
    stack.pop();
  }
}

function __settled(value) {
  return new Promise((resolve) => resolve(typeof value === 'function' ? value() : value));
}

function __thrown(fn) {
  if (typeof fn !== 'function') {
    throw new AssertionFailed('Expected a function for toThrow()');
  }
  try {
    fn();
  } catch (err) {
    return { threw: true, err };
  }
  return { threw: false, err: undefined };
}

function __matchesError(err, expected) {
  if (expected === undefined) {
    return true;
  }
  const text = __errorText(err);
  if (typeof expected === 'string') {
    return text.includes(expected);
  }
  if (expected instanceof RegExp) {
    return expected.test(text);
  }
  if (typeof expected === 'function') {
    return err instanceof expected;
  }
  if (expected instanceof Error) {
    return text === expected.message;
  }
  return false;
}

function expect(value) {
  const check = (pass, message) => {
    if (!pass) {
      throw new AssertionFailed(message);
    }
  };

  const equal = (verb) => (expected) =>
    check(__equals(value, expected), `Expected ${__format(value)} to ${verb} ${__format(expected)}`);

  const notEqual = (verb) => (expected) =>
    check(!__equals(value, expected), `Expected ${__format(value)} not to ${verb} ${__format(expected)}`);

  const resolvesTo = (verb) => (expected) =>
    __promise(
      __settled(value).then((actual) =>
        check(
          __equals(actual, expected),
          `Expected ${__format(actual)} to ${verb} ${__format(expected)}`
        )
      )
    );

  const contains = (item) =>
    value !== null && value !== undefined && typeof value.includes === 'function' && value.includes(item);

  return {
    resolves: {
      toBe: resolvesTo('be'),
      toEqual: resolvesTo('equal'),
      toStrictEqual: resolvesTo('strictly equal'),
    },
    rejects: {
      toThrow(expected) {
        return __promise(
          __settled(value).then(
            () => {
              throw new AssertionFailed(
                expected === undefined ? 'Expected error' : `Expected error ${__format(expected)}`
              );
            },
            () => undefined
          )
        );
      },
    },
    not: {
      toBe: notEqual('be'),
      toEqual: notEqual('equal'),
      toStrictEqual: notEqual('strictly equal'),
      toContain(item) {
        check(!contains(item), `Expected ${__format(value)} not to contain ${__format(item)}`);
      },
      toBeNull() {
        check(value !== null, 'Expected value not to be null');
      },
      toBeUndefined() {
        check(value !== undefined, 'Expected value not to be undefined');
      },
      toThrow() {
        check(!__thrown(value).threw, 'Expected function not to throw');
      },
    },
    toBe: equal('be'),
    toEqual: equal('equal'),
    toStrictEqual: equal('strictly equal'),
    toBeCloseTo(expected, tolerance = 0.01) {
      if (Math.abs(value - expected) <= tolerance) {
        return true;
      }
      throw new AssertionFailed(`Expected ${__format(value)} to be close to ${__format(expected)}`);
    },
    toBeTruthy() {
      check(Boolean(value), `Expected ${__format(value)} to be truthy`);
    },
    toBeFalsy() {
      check(!value, `Expected ${__format(value)} to be falsy`);
    },
    toBeNull() {
      check(value === null, `Expected ${__format(value)} to be null`);
    },
    toBeUndefined() {
      check(value === undefined, `Expected ${__format(value)} to be undefined`);
    },
    toBeDefined() {
      check(value !== undefined, 'Expected value to be defined');
    },
    toBeGreaterThan(expected) {
      check(value > expected, `Expected ${__format(value)} to be greater than ${__format(expected)}`);
    },
    toBeGreaterThanOrEqual(expected) {
      check(value >= expected, `Expected ${__format(value)} to be at least ${__format(expected)}`);
    },
    toBeLessThan(expected) {
      check(value < expected, `Expected ${__format(value)} to be less than ${__format(expected)}`);
    },
    toBeLessThanOrEqual(expected) {
      check(value <= expected, `Expected ${__format(value)} to be at most ${__format(expected)}`);
    },
    toContain(item) {
      check(contains(item), `Expected ${__format(value)} to contain ${__format(item)}`);
    },
    toHaveLength(length) {
      const actual = value === null || value === undefined ? undefined : value.length;
      check(actual === length, `Expected length ${__format(actual)} to be ${__format(length)}`);
    },
    toMatch(pattern) {
      const pass = pattern instanceof RegExp ? pattern.test(value) : String(value).includes(pattern);
      check(pass, `Expected ${__format(value)} to match ${__format(pattern)}`);
    },
    toThrow(expected) {
      const { threw, err } = __thrown(value);
      check(threw, 'Expected function to throw');
      check(
        __matchesError(err, expected),
        `Expected error ${__format(__errorText(err))} to match ${__format(expected)}`
      );
    },
  };
}
"#;

/// Full text spliced into the test program.
pub fn source() -> String {
    let mut text = String::with_capacity(SUITE_HARNESS.len() + ASSERTIONS.len() + 64);
    text.push_str(&format!("// playground harness v{}", HARNESS_VERSION));
    text.push_str(SUITE_HARNESS);
    text.push_str(ASSERTIONS);
    text
}

// ---------------------------------------------------------------------------
// Realm prelude
// ---------------------------------------------------------------------------

/// Knobs the host hands to the harness before the program loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessOptions {
    pub fail_fast: bool,
    pub max_console_entries: usize,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            fail_fast: true,
            max_console_entries: 1000,
        }
    }
}

/// Installs `console` (captured into [`CONSOLE_GLOBAL`]) and the frozen
/// `__playgroundOptions` global. Invoked with the options object as argument.
const PRELUDE: &str = r#"
(function (options) {
  const entries = [];

  const format = (value) => {
    if (typeof value === 'string') {
      return value;
    }
    if (value instanceof Error) {
      return `${value.name}: ${value.message}`;
    }
    try {
      const json = JSON.stringify(value);
      return json === undefined ? String(value) : json;
    } catch (_) {
      return String(value);
    }
  };

  const emit = (level) => (...args) => {
    if (entries.length < options.maxConsoleEntries) {
      entries.push({ level, text: args.map(format).join(' ') });
    }
  };

  globalThis.console = {
    log: emit('log'),
    info: emit('info'),
    debug: emit('debug'),
    warn: emit('warn'),
    error: emit('error'),
  };

  Object.defineProperty(globalThis, '__playgroundConsole', { value: entries });
  Object.defineProperty(globalThis, '__playgroundOptions', {
    value: Object.freeze({ failFast: options.failFast }),
  });
})"#;

/// Script evaluated in a fresh realm before the test program is parsed.
pub fn prelude(options: &HarnessOptions) -> String {
    let json = serde_json::to_string(options).unwrap_or_else(|_| "{}".to_string());
    format!("{}({});", PRELUDE, json)
}

/// Script returning the captured console entries as a JSON string.
pub fn console_snapshot_script() -> String {
    format!("JSON.stringify(globalThis.{} || [])", CONSOLE_GLOBAL)
}

// ---------------------------------------------------------------------------
// ConsoleEntry
// ---------------------------------------------------------------------------

/// Severity of a captured console call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Info,
    Debug,
    Warn,
    Error,
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleLevel::Log => write!(f, "log"),
            ConsoleLevel::Info => write!(f, "info"),
            ConsoleLevel::Debug => write!(f, "debug"),
            ConsoleLevel::Warn => write!(f, "warn"),
            ConsoleLevel::Error => write!(f, "error"),
        }
    }
}

/// A console call made by the harness or learner code during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleEntry {
    pub level: ConsoleLevel,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_exports_run_and_report() {
        let text = source();
        assert!(text.starts_with("// playground harness v1"));
        assert!(text.contains("export { __run as run, __report };"));
        assert!(text.contains(&format!("function {}()", REPORT_EXPORT)));
    }

    #[test]
    fn test_source_has_no_imports() {
        // spliced after the import block, so it must not add imports of its own
        assert!(!source().lines().any(|l| l.trim_start().starts_with("import ")));
    }

    #[test]
    fn test_source_declares_aliases() {
        let text = source();
        for alias in ["const xtest = test;", "const it = test;", "const xit = test;"] {
            assert!(text.contains(alias), "missing {}", alias);
        }
    }

    #[test]
    fn test_prelude_embeds_options() {
        let script = prelude(&HarnessOptions {
            fail_fast: false,
            max_console_entries: 5,
        });
        assert!(script.ends_with(r#"({"failFast":false,"maxConsoleEntries":5});"#));
        assert!(script.contains(CONSOLE_GLOBAL));
    }

    #[test]
    fn test_console_entry_decodes() {
        let entries: Vec<ConsoleEntry> =
            serde_json::from_str(r#"[{"level":"warn","text":"careful"}]"#).unwrap();
        assert_eq!(entries[0].level, ConsoleLevel::Warn);
        assert_eq!(entries[0].text, "careful");
    }
}
