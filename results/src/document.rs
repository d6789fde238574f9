use std::{
    fs,
    io::{self, BufRead, BufReader},
    path::Path,
};

use quick_xml::{
    events::{attributes::AttrError, BytesStart, BytesText, Event},
    Reader,
};
use thiserror::Error;

const XMLNS: &str = "xmlns";
const XMLNS_PREFIX: &str = "xmlns:";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("could not read file: {0}")]
    Io(#[from] io::Error),
    #[error("malformed xml: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),
    #[error("no root element found")]
    RootNotFound,
    #[error("multiple root elements found")]
    RootMultipleFound,
    #[error("element `{0}` is never closed")]
    UnclosedElement(String),
    #[error("end tag `{0}` found without start tag")]
    StartTagNotFound(String),
}

/// An XML element with its namespace already resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    /// Qualified name, exactly as written (`ns:TestRun` stays `ns:TestRun`).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map(|(_, local)| local)
            .unwrap_or(&self.name)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute value with surrounding whitespace removed; blank values count as missing.
    pub fn attr_trimmed(&self, name: &str) -> Option<&str> {
        self.attr(name).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn children_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children
            .iter()
            .filter(move |c| c.local_name() == local_name)
    }

    pub fn child(&self, local_name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.local_name() == local_name)
    }

    /// Follows a chain of child names, e.g. `["failure", "message"]`.
    pub fn path(&self, local_names: &[&str]) -> Option<&Element> {
        local_names
            .iter()
            .try_fold(self, |element, name| element.child(name))
    }

    /// This element's own text and CDATA, trimmed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text of this element and every descendant, one line per non-empty piece.
    pub fn deep_text(&self) -> String {
        self.descendants()
            .map(Element::text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// This element followed by every descendant, in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    pub fn descendants_named<'a>(
        &'a self,
        local_name: &'a str,
    ) -> impl Iterator<Item = &'a Element> {
        self.descendants()
            .filter(move |e| e.local_name() == local_name)
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

/// A fully loaded XML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn from_path<T: AsRef<Path>>(path: T) -> Result<Self, DocumentError> {
        let file = fs::File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    pub fn parse<R: BufRead>(xml: R) -> Result<Self, DocumentError> {
        let mut builder = DocumentBuilder::default();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            if builder
                .match_event(reader.read_event_into(&mut buf)?)?
                .is_none()
            {
                break;
            }
            buf.clear();
        }

        builder.finish()
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn descendants(&self) -> Descendants<'_> {
        self.root.descendants()
    }

    /// First element in document order with this local name and no namespace.
    pub fn find(&self, local_name: &str) -> Option<&Element> {
        self.descendants()
            .find(|e| e.namespace().is_none() && e.local_name() == local_name)
    }

    /// First element in document order with this local name inside `namespace`.
    pub fn find_in_namespace(&self, local_name: &str, namespace: &str) -> Option<&Element> {
        self.descendants()
            .find(|e| e.namespace() == Some(namespace) && e.local_name() == local_name)
    }
}

/// Prefix (empty for the default namespace) to URI bindings introduced by one element.
type Scope = Vec<(String, String)>;

#[derive(Debug, Default)]
struct DocumentBuilder {
    root: Option<Element>,
    open_elements: Vec<Element>,
    scopes: Vec<Scope>,
}

impl DocumentBuilder {
    fn match_event(&mut self, event: Event) -> Result<Option<()>, DocumentError> {
        match event {
            Event::Eof => return Ok(None),
            Event::Start(e) => {
                self.open_element(&e)?;
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                self.close_element(name)?;
            }
            Event::Empty(e) => {
                let name = self.open_element(&e)?;
                self.close_element(name)?;
            }
            Event::Text(e) => self.append_text(&e)?,
            Event::CData(e) => self.append_text(&e.minimal_escape()?)?,
            _ => (),
        };
        Ok(Some(()))
    }

    fn open_element(&mut self, e: &BytesStart) -> Result<String, DocumentError> {
        if self.root.is_some() && self.open_elements.is_empty() {
            return Err(DocumentError::RootMultipleFound);
        }

        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        let mut scope = Scope::new();
        for attr in e.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            if key == XMLNS {
                scope.push((String::new(), value.clone()));
            } else if let Some(prefix) = key.strip_prefix(XMLNS_PREFIX) {
                scope.push((String::from(prefix), value.clone()));
            }
            attributes.push((key, value));
        }
        self.scopes.push(scope);

        let prefix = name.split_once(':').map(|(p, _)| p).unwrap_or_default();
        let namespace = self.resolve(prefix);

        self.open_elements.push(Element {
            name: name.clone(),
            namespace,
            attributes,
            ..Default::default()
        });
        Ok(name)
    }

    fn resolve(&self, prefix: &str) -> Option<String> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.clone())
            .filter(|uri| !uri.is_empty())
    }

    fn close_element(&mut self, name: String) -> Result<(), DocumentError> {
        let element = self
            .open_elements
            .pop()
            .ok_or(DocumentError::StartTagNotFound(name))?;
        self.scopes.pop();

        match self.open_elements.last_mut() {
            Some(parent) => parent.children.push(element),
            None => self.root = Some(element),
        }
        Ok(())
    }

    fn append_text(&mut self, e: &BytesText) -> Result<(), DocumentError> {
        // Text outside the root element (e.g. stray whitespace) carries nothing useful
        if let Some(element) = self.open_elements.last_mut() {
            let text = e.unescape()?;
            let text = text.trim();
            if !text.is_empty() {
                if !element.text.is_empty() {
                    element.text.push('\n');
                }
                element.text.push_str(text);
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Document, DocumentError> {
        if let Some(unclosed) = self.open_elements.pop() {
            return Err(DocumentError::UnclosedElement(unclosed.name));
        }
        self.root
            .map(|root| Document { root })
            .ok_or(DocumentError::RootNotFound)
    }
}
