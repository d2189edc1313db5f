//! Evaluation context: the only names a formula can see.

use std::collections::BTreeMap;

use super::value::Value;

/// Named variables available to a formula.
///
/// Nothing outside this map (and the whitelisted functions) is reachable
/// from formula text.
///
/// # Example
///
/// ```
/// use professional_tax::formula::{EvalContext, Formula};
/// use rust_decimal::Decimal;
///
/// let mut context = EvalContext::new();
/// context.set("gross_pay", Decimal::new(20000, 0));
///
/// let formula = Formula::parse("200 if gross_pay > 10000 else 0").unwrap();
/// assert_eq!(formula.evaluate_amount(&context).unwrap(), Decimal::new(200, 0));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalContext {
    variables: BTreeMap<String, Value>,
}

impl EvalContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a variable, replacing any previous binding.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Binds a variable only if the name is still free.
    ///
    /// Returns false if the name was already bound.
    pub fn set_if_absent(&mut self, name: impl Into<String>, value: impl Into<Value>) -> bool {
        let name = name.into();
        if self.variables.contains_key(&name) {
            return false;
        }
        self.variables.insert(name, value.into());
        true
    }

    /// Looks up a variable.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Returns true if the variable is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Iterates over all bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Returns true if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Turns a salary component name into a formula variable name.
///
/// Lower-cases the name and replaces every character that cannot appear in
/// an identifier with `_`. A leading digit is prefixed with `_`.
///
/// # Examples
///
/// ```
/// use professional_tax::formula::variable_name;
///
/// assert_eq!(variable_name("House Rent Allowance"), "house_rent_allowance");
/// assert_eq!(variable_name("Basic (Fixed)"), "basic__fixed_");
/// assert_eq!(variable_name("13th Month"), "_13th_month");
/// ```
pub fn variable_name(component: &str) -> String {
    let mut name: String = component
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                '_'
            }
        })
        .collect();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_set_if_absent_keeps_first_binding() {
        let mut context = EvalContext::new();
        context.set("gross_pay", Decimal::new(100, 0));
        assert!(!context.set_if_absent("gross_pay", Decimal::new(5, 0)));
        assert!(context.set_if_absent("basic", Decimal::new(5, 0)));
        assert_eq!(context.get("gross_pay"), Some(&Value::Number(Decimal::new(100, 0))));
        assert_eq!(context.len(), 2);
    }

    #[test]
    fn test_iter_is_sorted_by_name() {
        let mut context = EvalContext::new();
        context.set("zeta", true);
        context.set("alpha", false);
        let names: Vec<&str> = context.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_variable_name_replaces_separators() {
        assert_eq!(variable_name("Professional Tax"), "professional_tax");
        assert_eq!(variable_name("  Leave-Encashment "), "leave_encashment");
        assert_eq!(variable_name("DA"), "da");
    }
}
