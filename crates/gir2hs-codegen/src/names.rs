//! Generated-name supply.
//!
//! Type variables for constrained wrapper parameters come from an explicit
//! supply object threaded through planning. No global state: two plans of
//! the same callable hand out identical names.

/// Supply of fresh type-variable names: `a`, `b`, ..., `z`, `a1`, `b1`, ...
#[derive(Debug, Default)]
pub struct NameSupply {
    next: u32,
}

impl NameSupply {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next unused type variable.
    pub fn fresh_tyvar(&mut self) -> String {
        let letter = (b'a' + (self.next % 26) as u8) as char;
        let round = self.next / 26;
        self.next += 1;
        if round == 0 {
            letter.to_string()
        } else {
            format!("{letter}{round}")
        }
    }
}

/// Lower-camel form of a snake_case metadata name (`widget_set_name` →
/// `widgetSetName`).
pub fn lower_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Upper-first form, for `Just`-pattern binders (`items` → `Items`).
pub fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The native-representation variable for an argument (`items` → `items'`).
pub fn native_var(arg_name: &str) -> String {
    format!("{arg_name}'")
}

/// The wrapper-allocated buffer variable for an out-direction argument
/// (`items` → `items''`).
pub fn buffer_var(arg_name: &str) -> String {
    format!("{arg_name}''")
}
