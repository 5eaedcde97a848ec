// Minimal XML reader for dictionary sources.
//
// Supports elements, attributes (single or double quoted), character data,
// the five predefined entities plus numeric references, CDATA sections,
// comments, processing instructions and a DOCTYPE declaration (the last three
// are skipped). Namespaces and DTD internals are not interpreted.

/// A syntax error with the line it was found on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct MarkupError {
    pub line: usize,
    pub message: String,
}

/// A start tag, possibly self-closing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub self_closing: bool,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(Tag),
    End { name: String, line: usize },
    Text { text: String, line: usize },
}

/// Pull reader over a complete document.
///
/// Checks that end tags match their start tags and that exactly one root
/// element exists; text outside the root must be whitespace.
pub struct Reader<'a> {
    text: &'a str,
    pos: usize,
    line: usize,
    open: Vec<String>,
    root_seen: bool,
}

impl<'a> Reader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            line: 1,
            open: Vec::new(),
            root_seen: false,
        }
    }

    fn error(&self, message: impl Into<String>) -> MarkupError {
        MarkupError {
            line: self.line,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    /// Advance `len` bytes, counting newlines.
    fn advance(&mut self, len: usize) {
        let end = self.pos + len;
        self.line += self.text[self.pos..end].matches('\n').count();
        self.pos = end;
    }

    /// Advance past the next occurrence of `terminator`.
    fn skip_past(&mut self, terminator: &str, what: &str) -> Result<&'a str, MarkupError> {
        match self.rest().find(terminator) {
            Some(offset) => {
                let body = &self.rest()[..offset];
                self.advance(offset + terminator.len());
                Ok(body)
            }
            None => Err(self.error(format!("unterminated {what}"))),
        }
    }

    fn skip_whitespace(&mut self) {
        let len = self.rest().len() - self.rest().trim_start().len();
        self.advance(len);
    }

    fn read_name(&mut self) -> Result<String, MarkupError> {
        let len = self
            .rest()
            .find(|c: char| c.is_whitespace() || matches!(c, '/' | '>' | '=' | '<'))
            .unwrap_or(self.rest().len());
        if len == 0 {
            return Err(self.error("expected a name"));
        }
        let name = self.rest()[..len].to_string();
        self.advance(len);
        Ok(name)
    }

    /// Next event, or `None` at the end of a well-formed document.
    pub fn next_event(&mut self) -> Result<Option<Event>, MarkupError> {
        loop {
            if self.pos >= self.text.len() {
                if let Some(name) = self.open.last() {
                    return Err(self.error(format!("unclosed element <{name}>")));
                }
                if !self.root_seen {
                    return Err(self.error("document has no root element"));
                }
                return Ok(None);
            }

            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.advance(4);
                self.skip_past("-->", "comment")?;
            } else if rest.starts_with("<?") {
                self.advance(2);
                self.skip_past("?>", "processing instruction")?;
            } else if rest.starts_with("<![CDATA[") {
                let line = self.line;
                self.advance(9);
                let body = self.skip_past("]]>", "CDATA section")?;
                if self.open.is_empty() {
                    return Err(MarkupError {
                        line,
                        message: "character data outside the root element".to_string(),
                    });
                }
                return Ok(Some(Event::Text {
                    text: body.to_string(),
                    line,
                }));
            } else if rest.starts_with("<!") {
                self.advance(2);
                self.skip_past(">", "declaration")?;
            } else if rest.starts_with("</") {
                return self.end_tag().map(Some);
            } else if rest.starts_with('<') {
                return self.start_tag().map(Some);
            } else {
                let line = self.line;
                let len = rest.find('<').unwrap_or(rest.len());
                let raw = &rest[..len];
                self.advance(len);
                if self.open.is_empty() {
                    if raw.trim().is_empty() {
                        continue;
                    }
                    return Err(MarkupError {
                        line,
                        message: "text outside the root element".to_string(),
                    });
                }
                let text = decode_entities(raw).map_err(|message| MarkupError { line, message })?;
                return Ok(Some(Event::Text { text, line }));
            }
        }
    }

    fn start_tag(&mut self) -> Result<Event, MarkupError> {
        let line = self.line;
        self.advance(1);
        let name = self.read_name()?;
        if self.open.is_empty() && self.root_seen {
            return Err(self.error(format!("second root element <{name}>")));
        }

        let mut attributes: Vec<(String, String)> = Vec::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.advance(2);
                if self.open.is_empty() {
                    self.root_seen = true;
                }
                return Ok(Event::Start(Tag {
                    name,
                    attributes,
                    self_closing: true,
                    line,
                }));
            }
            if rest.starts_with('>') {
                self.advance(1);
                self.root_seen = true;
                self.open.push(name.clone());
                return Ok(Event::Start(Tag {
                    name,
                    attributes,
                    self_closing: false,
                    line,
                }));
            }
            if rest.is_empty() {
                return Err(self.error(format!("unterminated tag <{name}>")));
            }

            let key = self.read_name()?;
            self.skip_whitespace();
            if !self.rest().starts_with('=') {
                return Err(self.error(format!("attribute {key:?} has no value")));
            }
            self.advance(1);
            self.skip_whitespace();
            let quote = match self.rest().chars().next() {
                Some(q @ ('"' | '\'')) => q,
                _ => return Err(self.error(format!("attribute {key:?} value must be quoted"))),
            };
            self.advance(1);
            let raw = self.skip_past(&quote.to_string(), "attribute value")?;
            let value = decode_entities(raw).map_err(|message| self.error(message))?;
            if attributes.iter().any(|(k, _)| *k == key) {
                return Err(self.error(format!("duplicate attribute {key:?}")));
            }
            attributes.push((key, value));
        }
    }

    fn end_tag(&mut self) -> Result<Event, MarkupError> {
        let line = self.line;
        self.advance(2);
        let name = self.read_name()?;
        self.skip_whitespace();
        if !self.rest().starts_with('>') {
            return Err(self.error(format!("malformed end tag </{name}")));
        }
        self.advance(1);
        match self.open.pop() {
            Some(open) if open == name => Ok(Event::End { name, line }),
            Some(open) => Err(MarkupError {
                line,
                message: format!("expected </{open}>, found </{name}>"),
            }),
            None => Err(MarkupError {
                line,
                message: format!("unexpected end tag </{name}>"),
            }),
        }
    }
}

/// Replace entity and character references.
fn decode_entities(raw: &str) -> Result<String, String> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| "unterminated entity reference".to_string())?;
        let entity = &after[..semi];
        let decoded = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .ok_or_else(|| format!("unknown entity &{entity};"))?
            }
        };
        out.push(decoded);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Document tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text { text: String, line: usize },
}

/// An element with its attributes and children in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
    pub line: usize,
}

impl Element {
    fn from_tag(tag: Tag) -> Self {
        Self {
            name: tag.name,
            attributes: tag.attributes,
            children: Vec::new(),
            line: tag.line,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn require_attr(&self, name: &str) -> Result<&str, MarkupError> {
        self.attr(name).ok_or_else(|| MarkupError {
            line: self.line,
            message: format!("<{}> is missing the {name:?} attribute", self.name),
        })
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text { .. } => None,
        })
    }

    /// Fail on any non-whitespace text directly inside this element.
    pub fn reject_text(&self) -> Result<(), MarkupError> {
        for node in &self.children {
            if let Node::Text { text, line } = node {
                if !text.trim().is_empty() {
                    return Err(MarkupError {
                        line: *line,
                        message: format!("unexpected text {:?} inside <{}>", text.trim(), self.name),
                    });
                }
            }
        }
        Ok(())
    }

    /// Concatenated text content of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                Node::Text { text, .. } => out.push_str(text),
                Node::Element(e) => out.push_str(&e.text()),
            }
        }
        out
    }
}

/// Read a whole document into its root element.
pub fn parse_document(text: &str) -> Result<Element, MarkupError> {
    let mut reader = Reader::new(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    while let Some(event) = reader.next_event()? {
        match event {
            Event::Start(tag) => {
                let self_closing = tag.self_closing;
                let element = Element::from_tag(tag);
                if self_closing {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Element(element)),
                        None => root = Some(element),
                    }
                } else {
                    stack.push(element);
                }
            }
            Event::End { .. } => {
                if let Some(element) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Element(element)),
                        None => root = Some(element),
                    }
                }
            }
            Event::Text { text, line } => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text { text, line });
                }
            }
        }
    }

    root.ok_or_else(|| MarkupError {
        line: 1,
        message: "document has no root element".to_string(),
    })
}
