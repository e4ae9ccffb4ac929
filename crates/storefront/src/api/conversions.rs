//! Mapping from backend payloads to core domain types.
//!
//! This is the single place that interprets backend payloads. Raw JSON is
//! decoded into the wire types by reading the canonical key first and then
//! its known aliases, so a payload carrying both spellings is fine.
//! Anything the canonical contract leaves out falls back to an empty value
//! rather than failing the whole response.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use bookstore_core::{
    AdminId, AdminProfile, Book, BookId, CurrencyCode, CustomerId, CustomerProfile, Price, Role,
};

use super::types::{AuthEnvelope, WireBook, WireBookPage, WireUser};

/// A user routed to the identity slot its role selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", content = "profile", rename_all = "snake_case")]
pub enum Identity {
    Customer(CustomerProfile),
    Admin(AdminProfile),
}

impl Identity {
    /// The role of this identity.
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::Customer(_) => Role::Customer,
            Self::Admin(_) => Role::Admin,
        }
    }

    /// Username shown in the page header.
    #[must_use]
    pub fn username(&self) -> &str {
        match self {
            Self::Customer(profile) => &profile.username,
            Self::Admin(profile) => &profile.username,
        }
    }
}

// =============================================================================
// Decoding
// =============================================================================

type Object = Map<String, Value>;

/// The first of `keys` whose value `read` accepts.
fn first<T>(map: &Object, keys: &[&str], read: impl Fn(&Value) -> Option<T>) -> Option<T> {
    keys.iter().find_map(|key| map.get(*key).and_then(&read))
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn small_number(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|n| u32::try_from(n).ok())
}

fn invalid(message: &str) -> serde_json::Error {
    <serde_json::Error as serde::de::Error>::custom(message)
}

/// Decode a user record. `None` unless `value` is an object.
#[must_use]
pub fn decode_user(value: &Value) -> Option<WireUser> {
    let map = value.as_object()?;
    Some(WireUser {
        id: first(map, &["id", "userId", "user_id"], |v| {
            (!v.is_null()).then(|| v.clone())
        }),
        full_name: first(map, &["fullName", "full_name", "name"], text),
        username: first(map, &["username"], text),
        email: first(map, &["email"], text),
        mobile_number: first(map, &["mobileNumber", "mobile_number", "phone"], text),
        profile_picture: first(map, &["profilePicture", "profile_picture"], text),
        date_of_birth: first(map, &["dateOfBirth", "date_of_birth"], text),
        bio: first(map, &["bio"], text),
        created_at: first(map, &["createdAt", "created_at"], text),
        updated_at: first(map, &["updatedAt", "updated_at"], text),
        role: first(map, &["role"], text),
        user_role: first(map, &["userRole", "user_role"], text),
        roles: map
            .get("roles")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(text).collect())
            .unwrap_or_default(),
    })
}

/// Decode an auth envelope. Anything that is not an object decodes as an
/// empty envelope, which callers treat as a refusal.
#[must_use]
pub fn decode_envelope(body: &Value) -> AuthEnvelope {
    let Some(map) = body.as_object() else {
        return AuthEnvelope::default();
    };
    AuthEnvelope {
        success: map.get("success").and_then(Value::as_bool),
        user: first(map, &["user", "data"], decode_user),
        access_token: first(map, &["accessToken", "access_token", "token"], text),
        refresh_token: first(map, &["refreshToken", "refresh_token"], text),
        message: first(map, &["message"], text),
    }
}

/// The user in a profile response: under `user` or `data`, or the body
/// itself.
#[must_use]
pub fn decode_profile_user(body: &Value) -> Option<WireUser> {
    body.as_object()
        .and_then(|map| first(map, &["user", "data"], decode_user))
        .or_else(|| decode_user(body))
}

/// Decode a single book.
///
/// # Errors
///
/// Returns an error if `id`, `title`, or `price` is missing or unreadable.
pub fn decode_book(value: &Value) -> Result<WireBook, serde_json::Error> {
    let map = value
        .as_object()
        .ok_or_else(|| invalid("book is not an object"))?;
    let id = first(map, &["id"], |v| (!v.is_null()).then(|| v.clone()))
        .ok_or_else(|| invalid("book without id"))?;
    let title = first(map, &["title"], text).ok_or_else(|| invalid("book without title"))?;
    let price = first(map, &["price"], |v| {
        serde_json::from_value::<Decimal>(v.clone()).ok()
    })
    .ok_or_else(|| invalid("book without price"))?;

    Ok(WireBook {
        id,
        title,
        author: first(map, &["author"], text),
        price,
        currency: first(map, &["currency"], text),
        isbn: first(map, &["isbn"], text),
        description: first(map, &["description"], text),
        cover_image: first(
            map,
            &["coverImage", "cover_image", "imageUrl", "image_url"],
            text,
        ),
        category: first(map, &["category"], text),
        stock: first(map, &["stock", "stockQuantity", "stock_quantity"], Value::as_i64),
    })
}

/// Decode a book listing: a page object or a bare array.
///
/// # Errors
///
/// Returns an error if the listing has no book array or a book in it
/// cannot be decoded.
pub fn decode_book_page(value: &Value) -> Result<WireBookPage, serde_json::Error> {
    let decode_all =
        |items: &[Value]| items.iter().map(decode_book).collect::<Result<Vec<_>, _>>();

    match value {
        Value::Array(items) => Ok(WireBookPage {
            content: decode_all(items.as_slice())?,
            ..WireBookPage::default()
        }),
        Value::Object(map) => {
            let items = first(map, &["content", "books", "items"], |v| {
                v.as_array().cloned()
            })
            .ok_or_else(|| invalid("book listing without content"))?;
            Ok(WireBookPage {
                content: decode_all(items.as_slice())?,
                total_elements: first(
                    map,
                    &["totalElements", "total", "total_elements"],
                    Value::as_u64,
                ),
                number: first(map, &["number", "page"], small_number),
                size: first(map, &["size"], small_number),
            })
        }
        _ => Err(invalid("book listing is neither an array nor an object")),
    }
}

// =============================================================================
// Conversion
// =============================================================================

/// Decide the role from `userRole`, then `role`, then the `roles` list.
#[must_use]
pub fn role_of(user: &WireUser) -> Role {
    let marked = Role::from_marker(user.user_role.as_deref().or(user.role.as_deref()));
    if marked.is_admin() {
        return marked;
    }
    if user
        .roles
        .iter()
        .any(|r| Role::from_marker(Some(r)).is_admin())
    {
        Role::Admin
    } else {
        Role::Customer
    }
}

/// Convert a wire user into the identity its role selects.
#[must_use]
pub fn convert_identity(user: WireUser) -> Identity {
    match role_of(&user) {
        Role::Admin => Identity::Admin(convert_admin(user)),
        Role::Customer => Identity::Customer(convert_customer(user)),
    }
}

/// Convert a wire user into a customer profile regardless of its role.
#[must_use]
pub fn convert_customer(user: WireUser) -> CustomerProfile {
    let mut roles = user.roles;
    if roles.is_empty()
        && let Some(role) = user.user_role.or(user.role)
    {
        roles.push(role);
    }

    CustomerProfile {
        id: CustomerId::new(parse_id(user.id.as_ref())),
        full_name: user.full_name.unwrap_or_default(),
        username: user.username.unwrap_or_default(),
        email: user.email.unwrap_or_default(),
        mobile_number: user.mobile_number.unwrap_or_default(),
        profile_picture: non_empty(user.profile_picture),
        date_of_birth: non_empty(user.date_of_birth),
        bio: non_empty(user.bio),
        created_at: user.created_at.as_deref().and_then(parse_timestamp),
        updated_at: user.updated_at.as_deref().and_then(parse_timestamp),
        roles,
    }
}

/// Convert a wire user into an admin profile regardless of its role.
#[must_use]
pub fn convert_admin(user: WireUser) -> AdminProfile {
    AdminProfile {
        id: AdminId::new(parse_id(user.id.as_ref())),
        username: user.username.unwrap_or_default(),
        email: user.email.unwrap_or_default(),
        role: Role::Admin,
        full_name: non_empty(user.full_name),
        user_role: user.user_role.or(user.role),
    }
}

/// Convert a wire book into a catalog entry.
#[must_use]
pub fn convert_book(book: WireBook) -> Book {
    let currency_code = match book.currency.as_deref().map(str::to_ascii_uppercase) {
        Some(code) if code == "EUR" => CurrencyCode::EUR,
        Some(code) if code == "GBP" => CurrencyCode::GBP,
        Some(code) if code == "INR" => CurrencyCode::INR,
        _ => CurrencyCode::USD,
    };

    Book {
        id: BookId::new(parse_id(Some(&book.id))),
        title: book.title,
        author: book.author.unwrap_or_default(),
        price: Price::new(book.price, currency_code),
        isbn: non_empty(book.isbn),
        description: non_empty(book.description),
        cover_image: non_empty(book.cover_image),
        category: non_empty(book.category),
        stock: book.stock.map(|n| u32::try_from(n.max(0)).unwrap_or(u32::MAX)),
    }
}

/// Read a numeric or numeric-string id; anything else maps to 0.
fn parse_id(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}

/// RFC 3339, or a zone-less ISO local date-time taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
