use super::decode::{decode_cp1251, read_cp1251};
use crate::services::archive::resolve_inside;
use crate::services::parser::xml_tree::parse_tree;
use crate::types::document::BundleIndex;
use crate::types::errors::{UpdError, UpdResult};
use std::fs;
use std::path::Path;

/// Name of the index document at the root of every bundle.
pub const INDEX_FILE: &str = "meta.xml";

/// Read `meta.xml` and return the paths of the card and main documents.
///
/// Only presence is checked: one `DocFlow` with a non-empty `Id`, a
/// `MainImage@Path` and an `ExternalCard@Path`.
pub fn locate_bundle(scratch_dir: &Path) -> UpdResult<BundleIndex> {
    let meta_path = scratch_dir.join(INDEX_FILE);
    if !meta_path.is_file() {
        return Err(UpdError::MissingIndex);
    }

    let bytes = fs::read(&meta_path)?;
    // Index files are normally UTF-8; some generators emit them in 1251.
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => decode_cp1251(e.as_bytes()),
    };

    let root = parse_tree(&text).map_err(|e| UpdError::MalformedIndex(e.to_string()))?;
    let flow = root
        .child("DocFlow")
        .or_else(|| root.find("DocFlow"))
        .ok_or_else(|| UpdError::MalformedIndex("DocFlow не найден".to_string()))?;

    let flow_id = flow
        .non_empty_attr("Id")
        .ok_or_else(|| UpdError::MalformedIndex("не указан идентификатор DocFlow".to_string()))?;

    let path_of = |element: &str| {
        flow.find(element)
            .and_then(|node| node.non_empty_attr("Path"))
            .map(normalize_separators)
    };

    let (main_document_path, card_path) = match (path_of("MainImage"), path_of("ExternalCard")) {
        (Some(main), Some(card)) => (main, card),
        _ => {
            return Err(UpdError::MalformedIndex(
                "пути к файлам не найдены в meta.xml".to_string(),
            ))
        }
    };

    for relative in [&main_document_path, &card_path] {
        if resolve_inside(scratch_dir, Path::new(relative)).is_none() {
            return Err(UpdError::PathTraversal(relative.clone()));
        }
    }

    Ok(BundleIndex {
        flow_id: flow_id.trim().to_string(),
        main_document_path,
        card_path,
    })
}

/// Read a payload named by the index, decoding it from Windows-1251.
pub fn read_payload(scratch_dir: &Path, relative: &str) -> UpdResult<String> {
    let path = resolve_inside(scratch_dir, Path::new(relative))
        .ok_or_else(|| UpdError::PathTraversal(relative.to_string()))?;
    if !path.is_file() {
        return Err(UpdError::MalformedIndex(format!(
            "файл {relative} указан в meta.xml, но отсутствует в архиве"
        )));
    }
    read_cp1251(&path)
}

fn normalize_separators(path: &str) -> String {
    path.trim().replace('\\', "/")
}
