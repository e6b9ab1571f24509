//! Address normalization.
//!
//! Free-text inputs go through `mailparse::addrparse`, structured inputs are
//! trusted as-is. Groups are flattened into their members before the leaves
//! are folded into the two shapes the API wants: a single `[address, name]`
//! pair for senders and an address -> name mapping for recipients.
use mailparse::{MailAddr, SingleInfo};
use serde::ser::{Serialize, Serializer};
use serde::Deserialize;

use crate::Error;

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct Address {
    pub address: String,

    /// Display name, empty when the input had none
    #[serde(default)]
    pub name: String,
}

impl Address {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }

    /// Legacy `[address, name]` pair
    pub fn pair(&self) -> (&str, &str) {
        (&self.address, &self.name)
    }
}

// mailparse keeps the separator in front of a mailbox that follows a
// closed group (`G: a@x;, b@x` yields `, b@x`)
fn strip_separator(s: &str) -> String {
    s.trim_start_matches(|c: char| c == ',' || c.is_whitespace())
        .trim_end()
        .to_string()
}

impl From<&SingleInfo> for Address {
    fn from(info: &SingleInfo) -> Self {
        Self {
            address: strip_separator(&info.addr),
            name: info
                .display_name
                .as_deref()
                .map(strip_separator)
                .unwrap_or_default(),
        }
    }
}

/// A leaf address or a named group of addresses.
/// Groups may nest when built by hand; parsed groups never do.
#[derive(Clone, Debug, PartialEq, serde::Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddressNode {
    Group {
        #[serde(default)]
        name: String,
        group: Vec<AddressNode>,
    },
    Mailbox(Address),
}

impl From<&MailAddr> for AddressNode {
    fn from(addr: &MailAddr) -> Self {
        match addr {
            MailAddr::Single(info) => AddressNode::Mailbox(info.into()),
            MailAddr::Group(info) => AddressNode::Group {
                name: info.group_name.clone(),
                group: info
                    .addrs
                    .iter()
                    .map(|a| AddressNode::Mailbox(a.into()))
                    .collect(),
            },
        }
    }
}

/// One entry of an address list
#[derive(Clone, Debug, PartialEq, serde::Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddressItem {
    Text(String),
    Node(AddressNode),
}

/// Every shape an address field of a `Message` accepts
#[derive(Clone, Debug, PartialEq, serde::Serialize, Deserialize)]
#[serde(untagged)]
pub enum Addresses {
    Text(String),
    List(Vec<AddressItem>),
    Node(AddressNode),
}

impl From<&str> for Addresses {
    fn from(s: &str) -> Self {
        Addresses::Text(s.to_string())
    }
}

impl From<String> for Addresses {
    fn from(s: String) -> Self {
        Addresses::Text(s)
    }
}

impl From<Address> for Addresses {
    fn from(a: Address) -> Self {
        Addresses::Node(AddressNode::Mailbox(a))
    }
}

impl From<AddressNode> for Addresses {
    fn from(node: AddressNode) -> Self {
        Addresses::Node(node)
    }
}

impl From<Vec<AddressItem>> for Addresses {
    fn from(items: Vec<AddressItem>) -> Self {
        Addresses::List(items)
    }
}

impl From<Vec<&str>> for Addresses {
    fn from(items: Vec<&str>) -> Self {
        Addresses::List(items.into_iter().map(AddressItem::from).collect())
    }
}

impl From<Vec<String>> for Addresses {
    fn from(items: Vec<String>) -> Self {
        Addresses::List(items.into_iter().map(AddressItem::Text).collect())
    }
}

impl From<Vec<Address>> for Addresses {
    fn from(items: Vec<Address>) -> Self {
        Addresses::List(items.into_iter().map(AddressItem::from).collect())
    }
}

impl From<&str> for AddressItem {
    fn from(s: &str) -> Self {
        AddressItem::Text(s.to_string())
    }
}

impl From<Address> for AddressItem {
    fn from(a: Address) -> Self {
        AddressItem::Node(AddressNode::Mailbox(a))
    }
}

/// Recipient mapping of address -> name.
///
/// Keeps insertion order. Inserting an address twice keeps the first
/// position and the last name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recipients(Vec<Address>);

impl Recipients {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn insert(&mut self, address: Address) {
        match self.0.iter_mut().find(|a| a.address == address.address) {
            Some(existing) => existing.name = address.name,
            None => self.0.push(address),
        }
    }

    pub fn get(&self, address: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|a| a.address == address)
            .map(|a| a.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Address> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::iter::FromIterator<Address> for Recipients {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        let mut recipients = Recipients::new();
        for address in iter {
            recipients.insert(address);
        }
        recipients
    }
}

impl Serialize for Recipients {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|a| (&a.address, &a.name)))
    }
}

/// Parse a free-text address list, named groups included.
pub fn parse(text: &str) -> Result<Vec<AddressNode>, Error> {
    let invalid = |e: mailparse::MailParseError| Error::InvalidAddress(format!("{}: {}", text, e));

    let parsed = match mailparse::addrparse(text) {
        Ok(list) => list,
        // `Group: a@x, b@x` is commonly written without the closing `;`
        Err(e) if text.contains(':') && !text.trim_end().ends_with(';') => {
            mailparse::addrparse(&format!("{};", text.trim_end())).map_err(|_| invalid(e))?
        }
        Err(e) => return Err(invalid(e)),
    };

    Ok(parsed.iter().map(AddressNode::from).collect())
}

fn flatten_node(node: &AddressNode, out: &mut Vec<Address>) -> Result<(), Error> {
    match node {
        AddressNode::Mailbox(address) => {
            if address.address.trim().is_empty() {
                return Err(Error::InvalidAddress(
                    "address: must be a non-empty string".to_string(),
                ));
            }
            out.push(address.clone());
        }
        AddressNode::Group { group, .. } => {
            for member in group {
                flatten_node(member, out)?;
            }
        }
    }

    Ok(())
}

fn flatten_text(text: &str, out: &mut Vec<Address>) -> Result<(), Error> {
    for node in parse(text)? {
        flatten_node(&node, out)?;
    }
    Ok(())
}

/// Expand the input into its leaf addresses, in encounter order.
/// Group labels never appear in the output.
pub fn flatten(input: &Addresses) -> Result<Vec<Address>, Error> {
    let mut leaves = Vec::new();

    match input {
        Addresses::Text(text) => flatten_text(text, &mut leaves)?,
        Addresses::Node(node) => flatten_node(node, &mut leaves)?,
        Addresses::List(items) => {
            for item in items {
                match item {
                    AddressItem::Text(text) => flatten_text(text, &mut leaves)?,
                    AddressItem::Node(node) => flatten_node(node, &mut leaves)?,
                }
            }
        }
    }

    Ok(leaves)
}

/// Normalize a `to`/`cc`/`bcc` field.
///
/// Returns `None` for an absent or blank field so the caller can omit it.
pub fn normalize_many(input: Option<&Addresses>) -> Result<Option<Recipients>, Error> {
    let input = match input {
        Some(Addresses::Text(text)) if text.trim().is_empty() => return Ok(None),
        Some(input) => input,
        None => return Ok(None),
    };

    Ok(Some(flatten(input)?.into_iter().collect()))
}

/// Normalize a `from`/`replyTo` field into its first address.
pub fn normalize_one(input: Option<&Addresses>) -> Result<Option<Address>, Error> {
    let input = match input {
        Some(input) => input,
        None => return Ok(None),
    };

    let empty = match input {
        Addresses::Text(text) => text.trim().is_empty(),
        Addresses::List(items) => items.is_empty(),
        Addresses::Node(_) => false,
    };
    if empty {
        return Err(Error::InvalidAddress("empty address".to_string()));
    }

    flatten(input)?
        .into_iter()
        .next()
        .map(Some)
        .ok_or_else(|| Error::InvalidAddress(format!("no address found in {:?}", input)))
}
