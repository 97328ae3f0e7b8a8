//! Image reference rewriting.
//!
//! The content fragment is parsed into a private tree, the elements of that
//! tree are edited, and the result is serialized back with html5ever.
//! The caller's markup is never touched.
use std::collections::HashMap;

use ego_tree::NodeRef;
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::{LocalName, Namespace, QualName};
use scraper::node::{Element, Node};
use scraper::{Html, StrTendril};
use wx2md_core::{local_image_path, MaterializedImage};
use wx_logging::wx_warn;

use crate::resolve::{image_source, LAZY_SRC_ATTR, SRC_ATTR};

/// The parser drops one newline right after these start tags.
const LEADING_NEWLINE_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

/// Original URL to generated filename, one entry per materialized image.
pub type ImageMapping = HashMap<String, String>;

pub fn image_mapping(images: &[MaterializedImage]) -> ImageMapping {
    images
        .iter()
        .map(|image| (image.original_url.clone(), image.filename.clone()))
        .collect()
}

/// Point every mapped image at `./images/<filename>` and drop its lazy attribute.
///
/// Images without a mapping entry are written back unchanged.
pub fn rewrite_images(content_markup: &str, mapping: &ImageMapping) -> String {
    edit_images(content_markup, |url| {
        mapping.get(url).map(|filename| local_image_path(filename))
    })
}

/// Markup ready for a Markdown renderer: every usable image source moved into
/// `src`, normalized, and links without text or images removed.
pub(crate) fn prepare_for_conversion(markup: &str) -> String {
    edit_fragment(markup, |url| Some(url.to_string()), true)
}

enum Edit {
    Source(String),
    RestoreNewline,
    Detach,
}

fn edit_images<F>(markup: &str, new_source: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    edit_fragment(markup, new_source, false)
}

fn edit_fragment<F>(markup: &str, mut new_source: F, drop_empty_links: bool) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut fragment = Html::parse_fragment(markup);

    let edits: Vec<_> = fragment
        .tree
        .nodes()
        .filter_map(|node| match node.value() {
            Node::Element(element) if element.name().eq_ignore_ascii_case("img") => {
                let src = image_source(element).and_then(|url| new_source(&url))?;
                Some((node.id(), Edit::Source(src)))
            }
            Node::Element(element)
                if drop_empty_links && element.name().eq_ignore_ascii_case("a") =>
            {
                is_empty_link(node).then(|| (node.id(), Edit::Detach))
            }
            Node::Text(text) if text.starts_with('\n') && node.prev_sibling().is_none() => {
                let parent = node.parent()?;
                let name = parent.value().as_element()?.name();
                LEADING_NEWLINE_ELEMENTS
                    .iter()
                    .any(|tag| tag.eq_ignore_ascii_case(name))
                    .then(|| (node.id(), Edit::RestoreNewline))
            }
            _ => None,
        })
        .collect();

    for (id, edit) in edits {
        let Some(mut node) = fragment.tree.get_mut(id) else {
            continue;
        };
        if let Edit::Detach = edit {
            node.detach();
            continue;
        }
        match (node.value(), edit) {
            (Node::Element(element), Edit::Source(src)) => set_source(element, &src),
            (Node::Text(text), Edit::RestoreNewline) => {
                let restored = format!("\n{}", &**text);
                text.text = StrTendril::from_slice(&restored);
            }
            _ => {}
        }
    }

    serialize_children(&fragment)
}

/// The parser splits an anchor around block content into copies; the one left
/// without text would otherwise render as a bare URL.
fn is_empty_link(node: NodeRef<'_, Node>) -> bool {
    node.descendants().all(|child| match child.value() {
        Node::Text(text) => text.trim().is_empty(),
        Node::Element(element) => !element.name().eq_ignore_ascii_case("img"),
        _ => true,
    })
}

fn set_source(element: &mut Element, src: &str) {
    element
        .attrs
        .retain(|(name, _)| !(*name.local).eq_ignore_ascii_case(LAZY_SRC_ATTR));
    let value = StrTendril::from_slice(src);
    match element
        .attrs
        .iter_mut()
        .find(|(name, _)| (*name.local).eq_ignore_ascii_case(SRC_ATTR))
    {
        Some((_, existing)) => *existing = value,
        None => element.attrs.push((
            QualName::new(None, Namespace::from(""), LocalName::from(SRC_ATTR)),
            value,
        )),
    }
}

fn serialize_children(fragment: &Html) -> String {
    let opts = SerializeOpts {
        scripting_enabled: true,
        traversal_scope: TraversalScope::ChildrenOnly(None),
        create_missing_parent: false,
    };
    let mut buf = Vec::new();
    if let Err(err) = serialize(&mut buf, &fragment.root_element(), opts) {
        wx_warn!("Serializing rewritten markup failed: {}", err);
    }
    String::from_utf8_lossy(&buf).into_owned()
}
