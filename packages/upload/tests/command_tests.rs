//! `upload_images` filtering and limits

mod common;

use common::*;
use folio_common::{Node, Position};
use folio_editor::Mutation;
use folio_upload::{
    upload_images, upload_images_from, CommandError, MediaFile, QueueConfig, UploadSource,
};
use std::sync::Arc;

#[tokio::test]
async fn test_non_images_filtered_out() {
    let document = shared_document();
    let queue = queue_with(&document, QueueConfig::default(), Arc::new(PassThrough));
    let uploader = Arc::new(RecordingUploader::default());

    let files = vec![
        MediaFile::new("notes.txt", "text/plain", vec![1u8]),
        png_file("a.png"),
    ];
    let ids = upload_images(&queue, files, Position::root(0), uploader.clone()).unwrap();
    assert_eq!(ids.len(), 1);

    queue.wait_idle().await;
    assert_eq!(uploader.names(), vec!["a.png"]);
}

#[tokio::test]
async fn test_no_accepted_files() {
    let document = shared_document();
    let queue = queue_with(&document, QueueConfig::default(), Arc::new(PassThrough));
    let uploader = Arc::new(RecordingUploader::default());

    let files = vec![
        MediaFile::new("a.txt", "text/plain", vec![1u8]),
        MediaFile::new("b.pdf", "application/pdf", vec![1u8]),
    ];
    let result = upload_images_from(UploadSource::Drop, &queue, files, Position::root(0), uploader);
    assert_eq!(result, Err(CommandError::NoAcceptedFiles(2)));
    assert!(queue.snapshots().is_empty());
}

#[tokio::test]
async fn test_max_files_per_drop_keeps_drop_order() {
    let document = shared_document();
    document
        .edit(Mutation::InsertNode {
            parent_id: None,
            index: 0,
            node: Node::paragraph("before"),
        })
        .unwrap();

    let queue = queue_with(&document, QueueConfig::default(), Arc::new(PassThrough));
    let uploader = Arc::new(RecordingUploader::default());

    let files = ["1.png", "2.png", "3.png", "4.png", "5.png"]
        .iter()
        .map(|name| png_file(name))
        .collect();
    let ids = upload_images_from(UploadSource::Paste, &queue, files, Position::root(1), uploader)
        .unwrap();
    assert_eq!(ids.len(), 3);

    queue.wait_idle().await;
    let srcs: Vec<String> = images(&document).into_iter().map(|a| a.src).collect();
    assert_eq!(
        srcs,
        vec![
            "https://cdn.test/1.png",
            "https://cdn.test/2.png",
            "https://cdn.test/3.png"
        ]
    );
    assert!(matches!(document.tree().blocks[0], Node::Paragraph { .. }));
}

#[tokio::test]
async fn test_embed_limit() {
    let document = shared_document();
    document
        .edit(Mutation::InsertNode {
            parent_id: None,
            index: 0,
            node: Node::embed("https://video.example.com/1"),
        })
        .unwrap();

    let config = QueueConfig {
        max_embeddings: Some(2),
        ..Default::default()
    };
    let queue = queue_with(&document, config, Arc::new(PassThrough));
    let uploader = Arc::new(RecordingUploader::default());

    // One slot left: only the first file goes in
    let ids = upload_images(
        &queue,
        vec![png_file("a.png"), png_file("b.png")],
        Position::root(1),
        uploader.clone(),
    )
    .unwrap();
    assert_eq!(ids.len(), 1);

    let result = upload_images(&queue, vec![png_file("c.png")], Position::root(2), uploader);
    assert_eq!(
        result,
        Err(CommandError::EmbedLimitReached {
            current: 2,
            limit: 2
        })
    );
}
