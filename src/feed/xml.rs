//! Small wrapper over the quick-xml writer used by the RSS and OPML renderers.

use std::io::Cursor;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::{OarssError, Result};

/// Indented XML document under construction.
pub(crate) struct XmlDocument {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlDocument {
    /// Start a UTF-8 document with an XML declaration.
    pub fn new() -> Result<Self> {
        let mut doc = Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        };
        doc.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(doc)
    }

    fn emit(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| OarssError::Render(e.to_string()))
    }

    /// Open an element with attributes.
    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut start = BytesStart::new(name);
        for attr in attrs {
            start.push_attribute(*attr);
        }
        self.emit(Event::Start(start))
    }

    /// Close an element.
    pub fn end(&mut self, name: &str) -> Result<()> {
        self.emit(Event::End(BytesEnd::new(name)))
    }

    /// Self-closing element with attributes.
    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut start = BytesStart::new(name);
        for attr in attrs {
            start.push_attribute(*attr);
        }
        self.emit(Event::Empty(start))
    }

    /// `<name>escaped text</name>`.
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.text_element_with(name, &[], text)
    }

    /// `<name attrs..>escaped text</name>`.
    pub fn text_element_with(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> Result<()> {
        if text.is_empty() {
            return self.empty(name, attrs);
        }
        self.start(name, attrs)?;
        self.emit(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    /// `<name><![CDATA[text]]></name>`.
    ///
    /// A literal `]]>` inside `text` is split across two sections so the
    /// document stays well-formed.
    pub fn cdata_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start(name, &[])?;
        let mut rest = text;
        while let Some(pos) = rest.find("]]>") {
            // Keep "]]" in this section and start the next one with ">".
            self.emit(Event::CData(BytesCData::new(&rest[..pos + 2])))?;
            rest = &rest[pos + 2..];
        }
        self.emit(Event::CData(BytesCData::new(rest)))?;
        self.end(name)
    }

    /// Finish and return the document text.
    pub fn finish(self) -> Result<String> {
        let bytes = self.writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(|e| OarssError::Render(e.to_string()))
    }
}
