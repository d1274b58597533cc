//! Minimal element tree over `quick-xml` for host responses.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::GameStreamError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }

    /// Parse a child's text, `None` when missing or malformed.
    pub fn child_parse<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.child_text(name).and_then(|t| t.trim().parse().ok())
    }

    /// Fail with [`GameStreamError::Status`] unless the root reports 200.
    pub fn check_status(&self) -> Result<(), GameStreamError> {
        let code = self
            .attribute("status_code")
            .and_then(|v| v.parse::<u32>().ok())
            .ok_or_else(|| GameStreamError::InvalidResponse("missing status_code".into()))?;
        if code == 200 {
            return Ok(());
        }
        let message = self
            .attribute("status_message")
            .unwrap_or("unknown error")
            .to_string();
        Err(GameStreamError::Status { code, message })
    }
}

fn start_element(start: &BytesStart<'_>) -> Result<Element, GameStreamError> {
    let mut element = Element {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        ..Default::default()
    };
    for attr in start.attributes() {
        let attr = attr.map_err(|e| GameStreamError::InvalidResponse(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| GameStreamError::InvalidResponse(e.to_string()))?;
        element.attributes.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value.into_owned(),
        ));
    }
    Ok(element)
}

/// Parse a whole document and return its root element.
pub fn parse(input: &str) -> Result<Element, GameStreamError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => {
                if root.is_none() {
                    *root = Some(element);
                }
            }
        }
    }

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(start_element(&start)?),
            Ok(Event::Empty(start)) => {
                let element = start_element(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::Text(text)) => {
                let value = text
                    .unescape()
                    .map_err(|e| GameStreamError::InvalidResponse(e.to_string()))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&value);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| GameStreamError::InvalidResponse("unbalanced document".into()))?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(GameStreamError::InvalidResponse(e.to_string())),
        }
    }

    if !stack.is_empty() {
        return Err(GameStreamError::InvalidResponse("truncated document".into()));
    }
    root.ok_or_else(|| GameStreamError::InvalidResponse("empty document".into()))
}
