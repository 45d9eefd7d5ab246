//! The four ordered post-passes that connect cross-references built up during pool/class parsing
//! (spec.md §4.5). Each pass drains one of `File`'s transient maps; by the time `resolve` returns,
//! all three are empty (spec.md §8).

use log::warn;

use crate::model::{Class, ClassState, File};

pub fn resolve(file: &mut File) {
    resolve_types(file);
    resolve_inheritance(file);
    resolve_external_methods(file);
    resolve_external_fields(file);
}

fn find_or_create_external(file: &mut File, descriptor: &str) -> u32 {
    if let Some(idx) = file.class_by_name(descriptor) {
        return idx;
    }
    let idx = file.classes.len() as u32;
    file.classes.push(Class {
        descriptor: 0,
        descriptor_str: descriptor.to_string(),
        access_flags: Default::default(),
        superclass: None,
        source_file: None,
        fields: Vec::new(),
        methods: Vec::new(),
        original_index: None,
        interfaces_off: 0,
        annotations_off: 0,
        state: ClassState::External,
    });
    file.class_by_descriptor.insert(descriptor.to_string(), idx);
    idx
}

fn resolve_types(file: &mut File) {
    let entries: Vec<(String, Vec<u32>)> = file
        .class_type_map
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for (descriptor, type_indices) in entries {
        let class_idx = find_or_create_external(file, &descriptor);
        for ty_idx in type_indices {
            if let Some(ty) = file.types.get_mut(ty_idx as usize) {
                ty.class = Some(class_idx);
            }
        }
    }
    file.class_type_map.clear();
}

fn resolve_inheritance(file: &mut File) {
    let pending = std::mem::take(&mut file.inheritance);
    for (parent_descriptor, children) in pending {
        let parent_idx = find_or_create_external(file, &parent_descriptor);
        for child_idx in children {
            if let Some(child) = file.classes.get_mut(child_idx as usize) {
                child.superclass = Some(parent_idx);
            }
        }
    }
}

fn resolve_external_methods(file: &mut File) {
    let pending = std::mem::take(&mut file.class_method_map);
    for (descriptor, method_indices) in pending {
        if method_indices.is_empty() {
            continue;
        }
        let class_idx = find_or_create_external(file, &descriptor);
        for method_idx in method_indices {
            if let Some(method) = file.methods.get_mut(method_idx as usize) {
                method.parent = Some(class_idx);
            } else {
                warn!("resolve_external_methods: dangling method index {method_idx}");
                continue;
            }
            if let Some(class) = file.classes.get_mut(class_idx as usize) {
                class.methods.push(method_idx);
            }
        }
    }
}

fn resolve_external_fields(file: &mut File) {
    let pending = std::mem::take(&mut file.class_field_map);
    for (descriptor, field_indices) in pending {
        if field_indices.is_empty() {
            continue;
        }
        let class_idx = find_or_create_external(file, &descriptor);
        for field_idx in field_indices {
            if let Some(field) = file.fields.get_mut(field_idx as usize) {
                field.parent = Some(class_idx);
            } else {
                warn!("resolve_external_fields: dangling field index {field_idx}");
                continue;
            }
            if let Some(class) = file.classes.get_mut(class_idx as usize) {
                class.fields.push(field_idx);
            }
        }
    }
}
