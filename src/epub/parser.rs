//! EPUB parsing utilities (container.xml, OPF package document)

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};

/// Dublin Core metadata carried by the package document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub title: String,
    pub creators: Vec<String>,
    pub language: String,
}

/// A `<manifest><item>` as written in the package document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
}

/// Parsed OPF package data.
#[derive(Debug, Clone, Default)]
pub struct OpfData {
    pub metadata: PackageMetadata,
    /// Manifest items in document order.
    pub manifest: Vec<RawManifestItem>,
    pub spine_ids: Vec<String>,
}

/// Parse META-INF/container.xml to find the OPF path.
pub fn parse_container_xml(content: &str) -> Result<String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Empty(e) | Event::Start(e) if local_name(e.name().as_ref()) == b"rootfile" => {
                if let Some(path) = attr_value(&e, b"full-path")?
                    && !path.is_empty()
                {
                    return Ok(path);
                }
                return Err(Error::MalformedArchive(
                    "rootfile missing full-path in container.xml".into(),
                ));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(Error::MalformedArchive(
        "No rootfile found in container.xml".into(),
    ))
}

/// Parse an OPF package document.
pub fn parse_opf(content: &str) -> Result<OpfData> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut data = OpfData::default();
    let mut in_metadata = false;
    let mut in_manifest = false;
    let mut in_spine = false;
    let mut current_element: Option<Vec<u8>> = None;
    let mut buf_text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                match local {
                    b"metadata" => in_metadata = true,
                    b"manifest" => in_manifest = true,
                    b"spine" => in_spine = true,
                    b"title" | b"creator" | b"language" if in_metadata => {
                        current_element = Some(local.to_vec());
                        buf_text.clear();
                    }
                    // Some packages write `<item ...></item>` instead of the empty form
                    b"item" if in_manifest => push_manifest_item(&e, &mut data)?,
                    b"itemref" if in_spine => push_itemref(&e, &mut data)?,
                    _ => {}
                }
            }
            Event::Empty(e) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"item" if in_manifest => push_manifest_item(&e, &mut data)?,
                    b"itemref" if in_spine => push_itemref(&e, &mut data)?,
                    _ => {}
                }
            }
            Event::Text(e) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if current_element.is_some() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        buf_text.push_str(&resolved);
                    }
                }
            }
            Event::End(e) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"metadata" => in_metadata = false,
                    b"manifest" => in_manifest = false,
                    b"spine" => in_spine = false,
                    _ => {}
                }

                if let Some(elem) = current_element.take() {
                    let value = buf_text.trim().to_string();
                    match elem.as_slice() {
                        b"title" if data.metadata.title.is_empty() => data.metadata.title = value,
                        b"creator" => data.metadata.creators.push(value),
                        b"language" if data.metadata.language.is_empty() => {
                            data.metadata.language = value
                        }
                        _ => {}
                    }
                    buf_text.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(data)
}

fn push_manifest_item(e: &BytesStart<'_>, data: &mut OpfData) -> Result<()> {
    let id = attr_value(e, b"id")?.unwrap_or_default();
    let href = attr_value(e, b"href")?.unwrap_or_default();
    let media_type = attr_value(e, b"media-type")?.unwrap_or_default();
    if !id.is_empty() && !href.is_empty() {
        data.manifest.push(RawManifestItem {
            id,
            href,
            media_type,
        });
    }
    Ok(())
}

fn push_itemref(e: &BytesStart<'_>, data: &mut OpfData) -> Result<()> {
    if let Some(idref) = attr_value(e, b"idref")? {
        data.spine_ids.push(idref);
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

/// Read an attribute by its unprefixed key, unescaping entities.
fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if local_name(attr.key.as_ref()) == key {
            let raw = String::from_utf8(attr.value.to_vec())
                .map_err(|e| Error::MalformedArchive(format!("attribute is not UTF-8: {e}")))?;
            let value = quick_xml::escape::unescape(&raw)
                .map_err(|e| Error::MalformedArchive(format!("bad attribute value: {e}")))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Extract local name from namespaced XML name (e.g., "dc:title" -> "title").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Resolve XML entity references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    if let Some(hex) = entity.strip_prefix("#x") {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#')
        && let Ok(code) = dec.parse::<u32>()
        && let Some(c) = char::from_u32(code)
    {
        return Some(c.to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"title"), b"title");
        assert_eq!(local_name(b"dc:title"), b"title");
        assert_eq!(local_name(b"opf:item"), b"item");
        assert_eq!(local_name(b""), b"");
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("apos"), Some("'".to_string()));
        assert_eq!(resolve_entity("amp"), Some("&".to_string()));
        assert_eq!(resolve_entity("#65"), Some("A".to_string()));
        assert_eq!(resolve_entity("#x2019"), Some("\u{2019}".to_string()));
        assert_eq!(resolve_entity("nbsp"), None);
    }

    #[test]
    fn test_parse_container_xml() {
        let container = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

        assert_eq!(parse_container_xml(container).unwrap(), "OEBPS/content.opf");
    }

    #[test]
    fn test_parse_container_xml_without_rootfile() {
        let container = r#"<container><rootfiles/></container>"#;
        assert!(matches!(
            parse_container_xml(container),
            Err(Error::MalformedArchive(_))
        ));
    }

    #[test]
    fn test_parse_container_xml_without_full_path() {
        let container = r#"<container><rootfiles><rootfile media-type="x"/></rootfiles></container>"#;
        assert!(matches!(
            parse_container_xml(container),
            Err(Error::MalformedArchive(_))
        ));
    }

    #[test]
    fn test_parse_opf() {
        let opf = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Agnes Grey</dc:title>
    <dc:creator>Anne Bront&#235;</dc:creator>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    <item id="ch2" href="text/ch2.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch1" href="text/ch1.xhtml" media-type="application/xhtml+xml"></item>
    <item id="img" href="images/a%20b.png" media-type="image/png"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="ch1"/>
    <itemref idref="ch2"/>
  </spine>
</package>"#;

        let data = parse_opf(opf).unwrap();
        assert_eq!(data.metadata.title, "Agnes Grey");
        assert_eq!(data.metadata.creators, vec!["Anne Bront\u{eb}"]);
        assert_eq!(data.metadata.language, "en");
        assert_eq!(data.manifest.len(), 3);
        assert_eq!(data.manifest[1].id, "ch1");
        assert_eq!(data.manifest[1].href, "text/ch1.xhtml");
        assert_eq!(data.spine_ids, vec!["ch1", "ch2"]);
    }

    #[test]
    fn test_parse_opf_unclosed_tag_is_malformed() {
        let opf = r#"<package><manifest><item id="a" href="a.xhtml"/></spine></package>"#;
        assert!(matches!(parse_opf(opf), Err(Error::MalformedArchive(_))));
    }
}
