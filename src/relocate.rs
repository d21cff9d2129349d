use crate::{ContentSequence, ContentUnit, ImageSource, Result, ScratchSpace};
use tracing::debug;

/// Moves every in-memory image of `sequence` into scratch storage and points the block at
/// the written file. Blocks that already reference a file are left alone.
///
/// Returns the number of images written. The first write failure aborts with
/// [`crate::Error::ImagePersistFailure`].
pub fn relocate_images(sequence: &mut ContentSequence, scratch: &ScratchSpace) -> Result<usize> {
    let mut relocated = 0;

    for unit in &mut sequence.units {
        let ContentUnit::Image(image) = unit else { continue };
        let ImageSource::Bytes(bytes) = &image.source else { continue };

        let path = scratch.store_image(image.page_index, image.sequence_in_page, &image.extension, bytes)?;
        image.source = ImageSource::File(path);
        relocated += 1;
    }

    debug!("Relocated {} images to {:?}", relocated, scratch.dir());
    Ok(relocated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, ImageBlock};

    fn image(page_index: usize, sequence_in_page: usize, bytes: &[u8]) -> ContentUnit {
        ContentUnit::Image(ImageBlock {
            source: ImageSource::Bytes(bytes.to_vec()),
            extension: "jpeg".to_string(),
            page_index,
            sequence_in_page,
        })
    }

    #[test]
    fn images_become_file_backed_and_text_is_untouched() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::shared(root.path()).unwrap();
        let mut sequence = ContentSequence::flow(vec![
            ContentUnit::text("Hello", 0),
            image(0, 0, b"first"),
            ContentUnit::text("World", 1),
            image(1, 0, b"second"),
        ]);

        assert_eq!(relocate_images(&mut sequence, &scratch).unwrap(), 2);
        assert_eq!(sequence.units[0], ContentUnit::text("Hello", 0));

        let paths: Vec<_> = sequence
            .image_blocks()
            .map(|block| match &block.source {
                ImageSource::File(path) => path.clone(),
                ImageSource::Bytes(_) => panic!("image left in memory"),
            })
            .collect();
        assert_eq!(paths, vec![root.path().join("image_0_0.jpeg"), root.path().join("image_1_0.jpeg")]);
        assert_eq!(std::fs::read(&paths[1]).unwrap(), b"second");
    }

    #[test]
    fn write_failure_aborts_relocation() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::shared(root.path()).unwrap();
        std::fs::create_dir(scratch.image_path(0, 0, "jpeg")).unwrap();
        let mut sequence = ContentSequence::flow(vec![image(0, 0, b"x")]);

        assert!(matches!(
            relocate_images(&mut sequence, &scratch),
            Err(Error::ImagePersistFailure { .. })
        ));
    }
}
