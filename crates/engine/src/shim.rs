// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JavaScript sources injected into, or run beside, the program under test
//!
//! The value encoder here mirrors `iosnap_core::value`; both sides must agree
//! on the tagged format.

use crate::syntax::{Dialect, BOOTSTRAP_MARKER};
use iosnap_adapters::RESULT_SENTINEL;

/// Prefix for renamed original implementations
pub const SHADOW_PREFIX: &str = "_snap_";

/// Shadow name for an exported function
pub fn shadow_name(name: &str) -> String {
    format!("{}{}", SHADOW_PREFIX, name)
}

/// The statement that re-exports a wrapped function under its own name
pub fn wrapper_export(name: &str) -> String {
    format!(
        "export const {name} = {marker}({shadow}, '{name}');",
        marker = BOOTSTRAP_MARKER,
        shadow = shadow_name(name),
    )
}

/// Encoder shared by the shim and the replay harness.
///
/// `@any` marks where TypeScript needs an `: any` annotation.
const ENCODER: &str = r#"const encode = (value@any, stack@any)@any => {
    if (value === undefined) return { $snap: 'undefined' };
    if (value === null) return null;
    switch (typeof value) {
      case 'number':
        return Number.isFinite(value) ? value : { $snap: 'number', v: String(value) };
      case 'bigint':
        return { $snap: 'bigint', v: value.toString() };
      case 'string':
      case 'boolean':
        return value;
      case 'symbol':
        return { $snap: 'symbol', v: value.description ?? '' };
      case 'function':
        return { $snap: 'function', v: value.name || 'anonymous' };
    }
    if (stack.includes(value)) return { $snap: 'circular' };
    if (value instanceof Date) {
      return { $snap: 'date', v: isNaN(value.getTime()) ? 'Invalid Date' : value.toISOString() };
    }
    if (value instanceof RegExp) return { $snap: 'regexp', v: { source: value.source, flags: value.flags } };
    if (value instanceof Error) return { $snap: 'error', v: { name: value.name, message: value.message } };
    stack.push(value);
    try {
      if (Array.isArray(value)) return Array.from(value, (item) => encode(item, stack));
      if (value instanceof Map) {
        return { $snap: 'map', v: Array.from(value, ([k, v]) => [encode(k, stack), encode(v, stack)]) };
      }
      if (value instanceof Set) return { $snap: 'set', v: Array.from(value, (item) => encode(item, stack)) };
      const out@any = {};
      for (const key of Object.keys(value)) out[key] = encode(value[key], stack);
      return Object.prototype.hasOwnProperty.call(out, '$snap') ? { $snap: 'object', v: out } : out;
    } finally {
      stack.pop();
    }
  };"#;

const BOOTSTRAP: &str = r#"/* io-snapshot capture shim (generated; `iosnap stop` removes it) */
function __snap_record@generic(fn@fn, name@string)@ret {
  const endpoint = 'http://127.0.0.1:@port/telemetry';
  const transport@any = globalThis;
  @encoder
  const send = (args@any, result@any) => {
    try {
      const body = JSON.stringify({ fnName: name, args, result: encode(result, []), at: new Date().toISOString() });
      transport
        .fetch(endpoint, { method: 'POST', headers: { 'Content-Type': 'application/json' }, body })
        .catch((err@any) => console.warn('[io-snapshot] capture of ' + name + ' dropped:', err && err.message));
    } catch (err@any) {
      console.warn('[io-snapshot] capture of ' + name + ' failed:', err && err.message);
    }
  };
  try {
    Object.defineProperty(fn, 'name', { value: name, configurable: true });
  } catch {}
  return new Proxy(fn, {
    apply(target@any, thisArg@any, argList@any) {
      let args@any = null;
      try {
        args = argList.map((arg@any) => encode(arg, []));
      } catch (err@any) {
        console.warn('[io-snapshot] arguments of ' + name + ' not serializable:', err && err.message);
      }
      const result = Reflect.apply(target, thisArg, argList);
      if (args === null) return result;
      if (result !== null && (typeof result === 'object' || typeof result === 'function') && typeof result.then === 'function') {
        result.then((value@any) => send(args, value), () => {});
        return result;
      }
      send(args, result);
      return result;
    },
  });
}
"#;

const HARNESS: &str = r#"import { pathToFileURL } from 'node:url';

const SENTINEL = '@sentinel';
@encoder
const decode = (value) => {
  if (Array.isArray(value)) return value.map(decode);
  if (value === null || typeof value !== 'object') return value;
  const fields = (obj) => {
    const out = {};
    for (const key of Object.keys(obj)) out[key] = decode(obj[key]);
    return out;
  };
  if (!Object.prototype.hasOwnProperty.call(value, '$snap')) return fields(value);
  const v = value.v;
  switch (value.$snap) {
    case 'undefined': return undefined;
    case 'number': return Number(v);
    case 'bigint': return BigInt(v);
    case 'date': return new Date(v);
    case 'regexp': return new RegExp(v.source, v.flags);
    case 'map': return new Map(v.map(([k, x]) => [decode(k), decode(x)]));
    case 'set': return new Set(v.map(decode));
    case 'error': {
      const err = new Error(v.message);
      err.name = v.name;
      return err;
    }
    case 'object': return fields(v);
    case 'function': {
      const fn = function () {};
      Object.defineProperty(fn, 'name', { value: v });
      return fn;
    }
    case 'symbol': return Symbol(v);
    default: return undefined;
  }
};
const message = (err) => String(err && err.message !== undefined ? err.message : err);
const reply = (body) => {
  process.stdout.write('\n' + SENTINEL + JSON.stringify(body) + '\n', () => process.exit(0));
};

const chunks = [];
for await (const chunk of process.stdin) chunks.push(chunk);
const request = JSON.parse(Buffer.concat(chunks).toString('utf8'));

let mod;
try {
  mod = await import(pathToFileURL(request.module).href);
} catch (err) {
  reply({ stage: 'load', error: message(err) });
}
if (mod !== undefined) {
  let fn = mod[request.export];
  if (typeof fn !== 'function' && mod.default && typeof mod.default === 'object') {
    fn = mod.default[request.export];
  }
  if (typeof fn !== 'function') {
    reply({ stage: 'export' });
  } else {
    const outcomes = [];
    for (const args of request.calls) {
      try {
        const value = await fn(...decode(args));
        outcomes.push({ ok: true, value: encode(value, []) });
      } catch (err) {
        outcomes.push({ ok: false, error: message(err) });
      }
    }
    reply({ outcomes });
  }
}
"#;

/// Bootstrap block for a file of the given dialect, reporting to `port`
pub fn bootstrap(dialect: Dialect, port: u16) -> String {
    let source = BOOTSTRAP
        .replace("@encoder", ENCODER)
        .replace("@port", &port.to_string());
    if dialect.is_typescript() {
        source
            .replace("@generic", "<T extends (...args: any[]) => any>")
            .replace("@fn", ": T")
            .replace("@string", ": string")
            .replace("@ret", ": T")
            .replace("@any", ": any")
    } else {
        ["@generic", "@fn", "@string", "@ret", "@any"]
            .iter()
            .fold(source, |acc, marker| acc.replace(marker, ""))
    }
}

/// ES module run by the Node replayer
pub fn replay_harness() -> String {
    let sentinel = RESULT_SENTINEL.replace('\'', "\\'");
    HARNESS
        .replace("@encoder", &ENCODER.replace("@any", ""))
        .replace("@sentinel", &sentinel)
}

#[cfg(test)]
#[path = "shim_tests.rs"]
mod tests;
