//! Field-level validation rules for outbound Konduto entities.
//!
//! # Design
//! Rules are static tables keyed by entity kind and field name. Lookup of an
//! unknown pair yields no rule, and a field without a rule always passes, so
//! the service can grow fields without the client rejecting them.
//! `validate_field` answers a single yes/no question and never fails;
//! `validate_entity` applies a whole table to a JSON object and collects every
//! problem instead of stopping at the first.

use std::fmt;
use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

/// The kinds of objects the schema knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Order,
    Customer,
    Payment,
    Address,
    Item,
    Seller,
}

impl Entity {
    pub fn as_str(self) -> &'static str {
        match self {
            Entity::Order => "order",
            Entity::Customer => "customer",
            Entity::Payment => "payment",
            Entity::Address => "address",
            Entity::Item => "item",
            Entity::Seller => "seller",
        }
    }

    fn rules(self) -> &'static [FieldRule] {
        match self {
            Entity::Order => ORDER_RULES,
            Entity::Customer => CUSTOMER_RULES,
            Entity::Payment => PAYMENT_RULES,
            Entity::Address => ADDRESS_RULES,
            Entity::Item => ITEM_RULES,
            Entity::Seller => SELLER_RULES,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation failure, addressed by its path inside the order
/// (`"customer.email"`, `"payment[0].bin"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub kind: FieldErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    Missing,
    Invalid,
}

impl FieldError {
    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FieldErrorKind::Missing,
        }
    }

    pub fn invalid(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FieldErrorKind::Invalid,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FieldErrorKind::Missing => write!(f, "{}: missing required field", self.path),
            FieldErrorKind::Invalid => write!(f, "{}: invalid value", self.path),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Id,
    Currency,
    Country,
    Date,
    DateTime,
    Bin,
    Last4,
    Expiration,
}

impl Format {
    fn regex(self) -> &'static Regex {
        const DAY: &str = r"\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])";
        const TIME: &str = r"([01]\d|2[0-3]):[0-5]\d:[0-5]\d";

        static ID: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Za-z0-9_-]{1,100}$"));
        static CURRENCY: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Z]{3}$"));
        static COUNTRY: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Z]{2}$"));
        static DATE: LazyLock<Regex> = LazyLock::new(|| compile(&format!("^{DAY}$")));
        static DATE_TIME: LazyLock<Regex> = LazyLock::new(|| compile(&format!("^{DAY}T{TIME}Z$")));
        static BIN: LazyLock<Regex> = LazyLock::new(|| compile(r"^\d{6}$"));
        static LAST4: LazyLock<Regex> = LazyLock::new(|| compile(r"^\d{4}$"));
        static EXPIRATION: LazyLock<Regex> = LazyLock::new(|| compile(r"^(0[1-9]|1[0-2])\d{4}$"));

        match self {
            Format::Id => &*ID,
            Format::Currency => &*CURRENCY,
            Format::Country => &*COUNTRY,
            Format::Date => &*DATE,
            Format::DateTime => &*DATE_TIME,
            Format::Bin => &*BIN,
            Format::Last4 => &*LAST4,
            Format::Expiration => &*EXPIRATION,
        }
    }
}

// Patterns are fixed above; a failure here is a programming error.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid pattern {pattern}: {e}"))
}

#[derive(Debug, Clone, Copy)]
enum Rule {
    /// Order identifier: a pattern-checked string or a non-negative integer.
    Id,
    Text { min: usize, max: usize },
    Amount,
    Integer { min: i64, max: i64 },
    Flag,
    OneOf(&'static [&'static str]),
    Pattern(Format),
    Ipv4,
    Object,
    List,
}

impl Rule {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Rule::Id => match value {
                Value::String(s) => Format::Id.regex().is_match(s),
                Value::Number(n) => n.is_u64(),
                _ => false,
            },
            Rule::Text { min, max } => value
                .as_str()
                .is_some_and(|s| (min..=max).contains(&s.chars().count())),
            Rule::Amount => value.as_f64().is_some_and(|v| v.is_finite() && v >= 0.0),
            Rule::Integer { min, max } => value.as_i64().is_some_and(|v| (min..=max).contains(&v)),
            Rule::Flag => value.is_boolean(),
            Rule::OneOf(allowed) => value.as_str().is_some_and(|s| allowed.contains(&s)),
            Rule::Pattern(format) => value.as_str().is_some_and(|s| format.regex().is_match(s)),
            Rule::Ipv4 => value.as_str().is_some_and(|s| s.parse::<Ipv4Addr>().is_ok()),
            Rule::Object => value.is_object(),
            Rule::List => value.is_array(),
        }
    }
}

#[derive(Debug)]
struct FieldRule {
    name: &'static str,
    required: bool,
    rule: Rule,
}

const fn required(name: &'static str, rule: Rule) -> FieldRule {
    FieldRule {
        name,
        required: true,
        rule,
    }
}

const fn optional(name: &'static str, rule: Rule) -> FieldRule {
    FieldRule {
        name,
        required: false,
        rule,
    }
}

const fn range(min: i64, max: i64) -> Rule {
    Rule::Integer { min, max }
}

const NAME: Rule = Rule::Text { min: 1, max: 100 };

static ORDER_RULES: &[FieldRule] = &[
    required("id", Rule::Id),
    optional("visitor", Rule::Text { min: 1, max: 40 }),
    required("total_amount", Rule::Amount),
    optional("shipping_amount", Rule::Amount),
    optional("tax_amount", Rule::Amount),
    optional("currency", Rule::Pattern(Format::Currency)),
    optional("installments", range(1, 999)),
    optional("ip", Rule::Ipv4),
    optional("purchased_at", Rule::Pattern(Format::DateTime)),
    required("customer", Rule::Object),
    optional("payment", Rule::List),
    optional("billing", Rule::Object),
    optional("shipping", Rule::Object),
    optional("shopping_cart", Rule::List),
    optional("seller", Rule::Object),
];

static CUSTOMER_RULES: &[FieldRule] = &[
    required("id", NAME),
    required("name", NAME),
    required("email", NAME),
    optional("phone1", NAME),
    optional("phone2", NAME),
    optional("tax_id", NAME),
    optional("dob", Rule::Pattern(Format::Date)),
    optional("created_at", Rule::Pattern(Format::Date)),
    optional("new", Rule::Flag),
    optional("vip", Rule::Flag),
];

static PAYMENT_RULES: &[FieldRule] = &[
    required(
        "type",
        Rule::OneOf(&["credit", "boleto", "debit", "transfer", "voucher"]),
    ),
    optional("status", Rule::OneOf(&["approved", "declined", "pending"])),
    optional("bin", Rule::Pattern(Format::Bin)),
    optional("last4", Rule::Pattern(Format::Last4)),
    optional("expiration_date", Rule::Pattern(Format::Expiration)),
];

static ADDRESS_RULES: &[FieldRule] = &[
    optional("name", NAME),
    optional("address1", NAME),
    optional("address2", NAME),
    optional("city", NAME),
    optional("state", NAME),
    optional("zip", NAME),
    optional("country", Rule::Pattern(Format::Country)),
];

static ITEM_RULES: &[FieldRule] = &[
    optional("sku", NAME),
    optional("product_code", NAME),
    optional("category", range(100, 9999)),
    optional("name", NAME),
    optional("description", Rule::Text { min: 1, max: 600 }),
    optional("unit_cost", Rule::Amount),
    optional("quantity", range(1, i64::MAX)),
    optional("discount", Rule::Amount),
    optional("created_at", Rule::Pattern(Format::Date)),
];

static SELLER_RULES: &[FieldRule] = &[
    optional("id", NAME),
    optional("name", NAME),
    optional("created_at", Rule::Pattern(Format::Date)),
];

/// Check a single value against the rule for `(entity, field)`.
///
/// Returns `true` when no rule exists for the pair.
pub fn validate_field(entity: Entity, field: &str, value: &Value) -> bool {
    entity
        .rules()
        .iter()
        .find(|r| r.name == field)
        .map_or(true, |r| r.rule.accepts(value))
}

/// Apply every rule of `entity` to `object`, reporting paths under `prefix`.
///
/// `null` is treated the same as an absent key.
pub fn validate_entity(
    entity: Entity,
    prefix: &str,
    object: &Map<String, Value>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    for rule in entity.rules() {
        let path = if prefix.is_empty() {
            rule.name.to_string()
        } else {
            format!("{prefix}.{}", rule.name)
        };
        match object.get(rule.name) {
            None | Some(Value::Null) => {
                if rule.required {
                    errors.push(FieldError::missing(path));
                }
            }
            Some(value) => {
                if !rule.rule.accepts(value) {
                    errors.push(FieldError::invalid(path));
                }
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn order_id_accepts_identifier_strings_and_integers() {
        assert!(validate_field(Entity::Order, "id", &json!("ORD-2024_001")));
        assert!(validate_field(Entity::Order, "id", &json!(123)));
        assert!(validate_field(Entity::Order, "id", &json!("a".repeat(100))));
    }

    #[test]
    fn order_id_rejects_malformed_values() {
        assert!(!validate_field(Entity::Order, "id", &json!("")));
        assert!(!validate_field(Entity::Order, "id", &json!("has space")));
        assert!(!validate_field(Entity::Order, "id", &json!("a".repeat(101))));
        assert!(!validate_field(Entity::Order, "id", &json!(-4)));
        assert!(!validate_field(Entity::Order, "id", &json!(1.5)));
        assert!(!validate_field(Entity::Order, "id", &Value::Null));
        assert!(!validate_field(Entity::Order, "id", &json!(["x"])));
    }

    #[test]
    fn unknown_field_has_no_rule() {
        assert!(validate_field(Entity::Order, "gift_wrap", &json!(42)));
        assert!(validate_field(Entity::Seller, "rating", &Value::Null));
    }

    #[test]
    fn amounts_must_be_non_negative_numbers() {
        assert!(validate_field(Entity::Order, "total_amount", &json!(0)));
        assert!(validate_field(Entity::Order, "total_amount", &json!(312.71)));
        assert!(!validate_field(Entity::Order, "total_amount", &json!(-1.0)));
        assert!(!validate_field(Entity::Order, "total_amount", &json!("312.71")));
    }

    #[test]
    fn formats() {
        assert!(validate_field(Entity::Order, "currency", &json!("BRL")));
        assert!(!validate_field(Entity::Order, "currency", &json!("brl")));
        assert!(validate_field(Entity::Order, "ip", &json!("170.149.100.10")));
        assert!(!validate_field(Entity::Order, "ip", &json!("300.1.1.1")));
        assert!(validate_field(Entity::Order, "purchased_at", &json!("2024-03-01T12:30:00Z")));
        assert!(!validate_field(Entity::Order, "purchased_at", &json!("2024-03-01 12:30")));
        assert!(validate_field(Entity::Customer, "dob", &json!("1970-12-25")));
        assert!(!validate_field(Entity::Customer, "dob", &json!("1970-13-25")));
        assert!(validate_field(Entity::Payment, "bin", &json!("490172")));
        assert!(!validate_field(Entity::Payment, "bin", &json!("49017")));
        assert!(validate_field(Entity::Payment, "expiration_date", &json!("072027")));
        assert!(!validate_field(Entity::Payment, "expiration_date", &json!("132027")));
        assert!(validate_field(Entity::Address, "country", &json!("BR")));
        assert!(!validate_field(Entity::Address, "country", &json!("BRA")));
    }

    #[test]
    fn enumerations_and_ranges() {
        assert!(validate_field(Entity::Payment, "type", &json!("boleto")));
        assert!(!validate_field(Entity::Payment, "type", &json!("cash")));
        assert!(validate_field(Entity::Item, "category", &json!(9999)));
        assert!(!validate_field(Entity::Item, "category", &json!(99)));
        assert!(!validate_field(Entity::Order, "installments", &json!(0)));
        assert!(validate_field(Entity::Customer, "vip", &json!(false)));
        assert!(!validate_field(Entity::Customer, "vip", &json!("false")));
    }

    #[test]
    fn validate_entity_reports_missing_and_invalid_fields() {
        let customer = json!({ "id": "c1", "email": "", "name": null, "phone1": "5511" });
        let errors = validate_entity(Entity::Customer, "customer", customer.as_object().unwrap());
        assert_eq!(
            errors,
            vec![
                FieldError::missing("customer.name"),
                FieldError::invalid("customer.email"),
            ]
        );
    }

    #[test]
    fn validate_entity_without_prefix_uses_bare_names() {
        let errors = validate_entity(Entity::Order, "", &Map::new());
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["id", "total_amount", "customer"]);
        assert!(errors.iter().all(|e| e.kind == FieldErrorKind::Missing));
    }

    #[test]
    fn field_error_display() {
        let err = FieldError::invalid("payment[0].bin");
        assert_eq!(err.to_string(), "payment[0].bin: invalid value");
    }
}
