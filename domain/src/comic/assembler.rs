//! Comic assembly
//!
//! Zips a script with its rendered images into a [`MultiPanelComic`].

use super::entities::{ComicContent, ComicPanel, ImageRef, MultiPanelComic};
use crate::concept::MathConcept;
use crate::core::error::DomainError;
use crate::options::GenerationOptions;
use chrono::Utc;
use uuid::Uuid;

pub struct ComicAssembler;

impl ComicAssembler {
    /// Assemble a comic with a fresh id and `created_at = now`.
    ///
    /// Panels and images are paired positionally; both must match
    /// `options.panel_count`.
    pub fn assemble(
        concept: &MathConcept,
        options: &GenerationOptions,
        content: ComicContent,
        images: Vec<ImageRef>,
    ) -> Result<MultiPanelComic, DomainError> {
        let expected = options.panel_count as usize;
        if content.panels.len() != expected || images.len() != expected {
            return Err(DomainError::ContractViolation(format!(
                "cannot assemble {} panels with {} images for a {}-panel comic",
                content.panels.len(),
                images.len(),
                expected
            )));
        }

        let panels = content
            .panels
            .into_iter()
            .zip(images)
            .enumerate()
            .map(|(index, (content, image))| ComicPanel {
                number: (index + 1) as u8,
                content,
                image,
            })
            .collect();

        Ok(MultiPanelComic {
            id: Uuid::new_v4().to_string(),
            title: content.title,
            topic: concept.topic().to_string(),
            options: options.clone(),
            panels,
            created_at: Utc::now(),
        })
    }
}
