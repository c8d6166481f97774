//! Integration tests for the comicpack crate.
//!
//! These tests run full packing pipelines from source directories to
//! validated archives on disk.

use comicpack::error::{Error, Result};
use comicpack::prelude::*;
use std::time::Duration;
use tokio::fs;
use tokio::time::timeout;

mod common;
use common::{
    LONG_TEST_TIMEOUT, archive_entry_names, assert_valid_zip_file, create_pages,
    get_comic_info_xml, read_archive_entry, setup_test_dirs, write_metadata,
};

#[tokio::test]
async fn test_multi_chapter_album() -> Result<()> {
    let test_dirs = setup_test_dirs("multi_chapter").await;
    let album = test_dirs.source_dir.join("MySeries");
    create_pages(&album.join("第1话"), &["1.jpg", "2.jpg", "3.jpg"]).await;
    create_pages(&album.join("第2话"), &["1.jpg", "2.jpg", "3.jpg"]).await;

    let packer = Packer::builder().build()?;
    let result = timeout(
        LONG_TEST_TIMEOUT,
        packer.pack_album(&album, &test_dirs.target_dir, None),
    )
    .await
    .expect("Test timed out");

    let series_dir = test_dirs.target_dir.join("MySeries");
    let first = series_dir.join("MySeries_c001.cbz");
    let second = series_dir.join("MySeries_c002.cbz");
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.archives, vec![first.clone(), second.clone()]);

    for (number, archive) in [(1, &first), (2, &second)] {
        assert_valid_zip_file(archive);
        assert_eq!(
            archive_entry_names(archive),
            vec!["ComicInfo.xml", "001.jpg", "002.jpg", "003.jpg"]
        );
        let xml = get_comic_info_xml(archive);
        assert!(xml.contains(&format!("<Number>{}</Number>", number)));
        assert!(xml.contains("<Count>2</Count>"));
        assert!(xml.contains(&format!("<Title>MySeries - Ch.{}</Title>", number)));
        assert!(xml.contains("<Series>MySeries</Series>"));
    }
    Ok(())
}

#[tokio::test]
async fn test_chapters_ordered_numerically() -> Result<()> {
    let test_dirs = setup_test_dirs("chapter_order").await;
    let album = test_dirs.source_dir.join("Ordered");
    for chapter in ["第10话", "第2话", "第1话"] {
        create_pages(&album.join(chapter), &["p1.jpg"]).await;
    }

    let result = Packer::default()
        .pack_album(&album, &test_dirs.target_dir, None)
        .await;
    assert_eq!(result.archives.len(), 3);

    // Each page stores its own source path, so the archive reveals its chapter.
    let expected = ["第1话", "第2话", "第10话"];
    for (archive, chapter) in result.archives.iter().zip(expected) {
        let source = album.join(chapter).join("p1.jpg");
        assert_eq!(
            read_archive_entry(archive, "001.jpg"),
            source.to_string_lossy().as_bytes()
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_duplicate_ordinals_get_dense_numbers() -> Result<()> {
    let test_dirs = setup_test_dirs("duplicate_ordinals").await;
    let album = test_dirs.source_dir.join("Dense");
    for chapter in ["a 2", "b 2", "c"] {
        create_pages(&album.join(chapter), &["p1.jpg"]).await;
    }

    let result = Packer::default()
        .pack_album(&album, &test_dirs.target_dir, None)
        .await;

    let series_dir = test_dirs.target_dir.join("Dense");
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(
        result.archives,
        vec![
            series_dir.join("Dense_c001.cbz"),
            series_dir.join("Dense_c002.cbz"),
            series_dir.join("Dense_c003.cbz"),
        ]
    );
    for (number, archive) in result.archives.iter().enumerate() {
        let xml = get_comic_info_xml(archive);
        assert!(xml.contains(&format!("<Number>{}</Number>", number + 1)));
        assert!(xml.contains("<Count>3</Count>"));
    }

    // "c" has no number and sorts first; the two "2" chapters follow.
    assert_eq!(
        read_archive_entry(&result.archives[0], "001.jpg"),
        album.join("c").join("p1.jpg").to_string_lossy().as_bytes()
    );
    Ok(())
}

#[tokio::test]
async fn test_flat_album() -> Result<()> {
    let test_dirs = setup_test_dirs("flat_album").await;
    let album = test_dirs.source_dir.join("Flat");
    create_pages(
        &album,
        &["p10.jpg", "p2.jpg", "p1.jpg", "p3.webp", "P4.png"],
    )
    .await;

    let result = Packer::default()
        .pack_album(&album, &test_dirs.target_dir, None)
        .await;

    let archive = test_dirs.target_dir.join("Flat").join("Flat_c001.cbz");
    assert_eq!(result.archives, vec![archive.clone()]);
    assert_eq!(
        archive_entry_names(&archive),
        vec!["ComicInfo.xml", "001.jpg", "002.jpg", "003.webp", "004.png", "005.jpg"]
    );
    assert_eq!(
        read_archive_entry(&archive, "005.jpg"),
        album.join("p10.jpg").to_string_lossy().as_bytes()
    );

    let xml = get_comic_info_xml(&archive);
    assert!(xml.contains("<Number>1</Number>"));
    assert!(!xml.contains("<Count>"));
    Ok(())
}

#[tokio::test]
async fn test_single_chapter_dir_packs_as_flat() -> Result<()> {
    let test_dirs = setup_test_dirs("single_chapter_dir").await;
    let album = test_dirs.source_dir.join("Single");
    create_pages(&album.join("第1话"), &["1.jpg", "2.jpg"]).await;
    // An image-less sibling is not a chapter.
    fs::create_dir_all(album.join("empty")).await?;

    let result = Packer::default()
        .pack_album(&album, &test_dirs.target_dir, None)
        .await;
    let archive = test_dirs.target_dir.join("Single").join("Single_c001.cbz");
    assert_eq!(result.archives, vec![archive.clone()]);
    assert_eq!(archive_entry_names(&archive).len(), 3);
    assert!(!get_comic_info_xml(&archive).contains("<Count>"));
    Ok(())
}

#[tokio::test]
async fn test_overwrite_disabled_keeps_archive() -> Result<()> {
    let test_dirs = setup_test_dirs("overwrite_disabled").await;
    let album = test_dirs.source_dir.join("Keep");
    create_pages(&album, &["1.jpg", "2.jpg"]).await;

    let packer = Packer::builder().overwrite(false).build()?;
    let first = packer.pack_album(&album, &test_dirs.target_dir, None).await;
    let archive = first.archives[0].clone();
    let bytes_before = fs::read(&archive).await?;
    let modified_before = fs::metadata(&archive).await?.modified()?;

    tokio::time::sleep(Duration::from_millis(20)).await;
    create_pages(&album, &["3.jpg"]).await;

    let second = packer.pack_album(&album, &test_dirs.target_dir, None).await;
    assert_eq!(second.archives, vec![archive.clone()]);
    assert!(second.is_success());
    assert_eq!(fs::read(&archive).await?, bytes_before);
    assert_eq!(fs::metadata(&archive).await?.modified()?, modified_before);
    Ok(())
}

#[tokio::test]
async fn test_overwrite_enabled_replaces_archive() -> Result<()> {
    let test_dirs = setup_test_dirs("overwrite_enabled").await;
    let album = test_dirs.source_dir.join("Replace");
    create_pages(&album, &["1.jpg", "2.jpg"]).await;

    let packer = Packer::default();
    let first = packer.pack_album(&album, &test_dirs.target_dir, None).await;
    let archive = first.archives[0].clone();
    assert_eq!(archive_entry_names(&archive).len(), 3);

    create_pages(&album, &["3.jpg"]).await;
    packer.pack_album(&album, &test_dirs.target_dir, None).await;
    assert_eq!(
        archive_entry_names(&archive),
        vec!["ComicInfo.xml", "001.jpg", "002.jpg", "003.jpg"]
    );
    Ok(())
}

#[tokio::test]
async fn test_album_without_images() -> Result<()> {
    let test_dirs = setup_test_dirs("no_images").await;
    let album = test_dirs.source_dir.join("Empty");
    fs::create_dir_all(album.join("sub")).await?;
    fs::write(album.join("readme.txt"), b"nothing here").await?;

    let result = Packer::default()
        .pack_album(&album, &test_dirs.target_dir, None)
        .await;
    assert!(!result.is_success());
    assert!(matches!(result.errors.as_slice(), [Error::NoImagesFound(_)]));
    assert!(!test_dirs.target_dir.join("Empty").exists());
    Ok(())
}

#[tokio::test]
async fn test_missing_album_dir() -> Result<()> {
    let test_dirs = setup_test_dirs("missing_album").await;
    let result = Packer::default()
        .pack_album(
            &test_dirs.source_dir.join("nope"),
            &test_dirs.target_dir,
            None,
        )
        .await;
    assert!(result.archives.is_empty());
    assert!(matches!(result.errors.as_slice(), [Error::NotFound(_)]));
    Ok(())
}

#[tokio::test]
async fn test_sidecar_metadata_applied() -> Result<()> {
    let test_dirs = setup_test_dirs("sidecar_metadata").await;
    let album = test_dirs.source_dir.join("350234");
    create_pages(&album, &["1.jpg"]).await;
    write_metadata(
        &album,
        r#"{
            "album_id": "350234",
            "name": "Sidecar: Title",
            "authors": ["A", "B"],
            "tags": [],
            "description": "",
            "page_count": 1,
            "likes": "12",
            "views": 300,
            "pub_date": "2021-11-05"
        }"#,
    )
    .await;

    let result = Packer::default()
        .pack_album(&album, &test_dirs.target_dir, None)
        .await;

    let archive = test_dirs
        .target_dir
        .join("Sidecar_ Title")
        .join("Sidecar_ Title_c001.cbz");
    assert_eq!(result.archives, vec![archive.clone()]);

    let xml = get_comic_info_xml(&archive);
    assert!(xml.contains("<Series>Sidecar: Title</Series>"));
    assert!(xml.contains("<Writer>A, B</Writer>"));
    assert!(xml.contains("<Artist>A, B</Artist>"));
    assert!(!xml.contains("<Genre>"));
    assert!(!xml.contains("<Summary>"));
    assert!(xml.contains("<PageCount>1</PageCount>"));
    assert!(xml.contains("<Year>2021</Year>"));
    assert!(xml.contains("<Month>11</Month>"));
    assert!(xml.contains(
        "<Comments>JMComic Album ID: 350234 Likes: 12 Views: 300 Comments: 0</Comments>"
    ));
    Ok(())
}

#[tokio::test]
async fn test_episode_list_orders_chapters() -> Result<()> {
    let test_dirs = setup_test_dirs("episode_order").await;
    let album = test_dirs.source_dir.join("Episodes");
    create_pages(&album.join("Start 9"), &["1.jpg"]).await;
    create_pages(&album.join("End 1"), &["1.jpg"]).await;
    write_metadata(
        &album,
        r#"{
            "name": "Episodes",
            "episodes": [
                {"name": "Start", "index": 1},
                {"name": "End", "index": 2}
            ]
        }"#,
    )
    .await;

    let result = Packer::default()
        .pack_album(&album, &test_dirs.target_dir, None)
        .await;
    assert_eq!(result.archives.len(), 2);
    assert_eq!(
        read_archive_entry(&result.archives[0], "001.jpg"),
        album.join("Start 9").join("1.jpg").to_string_lossy().as_bytes()
    );
    Ok(())
}

#[tokio::test]
async fn test_detail_overrides_sidecar() -> Result<()> {
    let test_dirs = setup_test_dirs("detail_override").await;
    let album = test_dirs.source_dir.join("album");
    create_pages(&album, &["1.jpg"]).await;
    write_metadata(
        &album,
        r#"{"album_id": "1", "name": "Sidecar Name", "tags": ["old"]}"#,
    )
    .await;

    let detail = AlbumDetail {
        id: "1".to_string(),
        name: "Detail Name".to_string(),
        authors: vec!["Writer".to_string()],
        ..Default::default()
    };
    let result = Packer::default()
        .pack_album(&album, &test_dirs.target_dir, Some(&detail))
        .await;

    let archive = test_dirs
        .target_dir
        .join("Detail Name")
        .join("Detail Name_c001.cbz");
    assert_eq!(result.archives, vec![archive.clone()]);
    let xml = get_comic_info_xml(&archive);
    assert!(xml.contains("<Series>Detail Name</Series>"));
    assert!(xml.contains("<Writer>Writer</Writer>"));
    // An empty detail list still overrides the sidecar.
    assert!(!xml.contains("<Genre>"));
    Ok(())
}

#[tokio::test]
async fn test_resolve_album_dir_strategies() -> Result<()> {
    let test_dirs = setup_test_dirs("resolve_strategies").await;
    let source = &test_dirs.source_dir;

    create_pages(&source.join("by_metadata"), &["1.jpg"]).await;
    write_metadata(&source.join("by_metadata"), r#"{"album_id": "111"}"#).await;
    create_pages(&source.join("222"), &["1.jpg"]).await;
    create_pages(&source.join("Some- Title"), &["1.jpg"]).await;

    let detail = |id: &str, name: &str| AlbumDetail {
        id: id.to_string(),
        name: name.to_string(),
        ..Default::default()
    };

    let resolved = resolve_album_dir(source, &detail("111", ""), "metadata.json").await?;
    assert_eq!(resolved.strategy, ResolutionStrategy::MetadataId);
    assert_eq!(resolved.path, source.join("by_metadata"));

    let resolved = resolve_album_dir(source, &detail("222", ""), "metadata.json").await?;
    assert_eq!(resolved.strategy, ResolutionStrategy::IdDirectory);
    assert_eq!(resolved.path, source.join("222"));

    let resolved = resolve_album_dir(source, &detail("999", "Some: Title"), "metadata.json").await?;
    assert_eq!(resolved.strategy, ResolutionStrategy::TitleDirectory);
    assert_eq!(resolved.path, source.join("Some- Title"));

    // Several candidates without a name match: the first with images wins.
    let resolved = resolve_album_dir(source, &detail("999", "Other"), "metadata.json").await?;
    assert_eq!(resolved.strategy, ResolutionStrategy::FirstWithImages);
    Ok(())
}

#[tokio::test]
async fn test_resolve_album_dir_only_subdirectory() -> Result<()> {
    let test_dirs = setup_test_dirs("resolve_only_subdir").await;
    let only = test_dirs.source_dir.join("whatever");
    fs::create_dir_all(&only).await?;

    let detail = AlbumDetail {
        id: "5".to_string(),
        ..Default::default()
    };
    let resolved = resolve_album_dir(&test_dirs.source_dir, &detail, "metadata.json").await?;
    assert_eq!(resolved.strategy, ResolutionStrategy::OnlySubdirectory);
    assert_eq!(resolved.path, only);
    Ok(())
}

#[tokio::test]
async fn test_resolve_album_dir_not_found() -> Result<()> {
    let test_dirs = setup_test_dirs("resolve_not_found").await;
    fs::create_dir_all(test_dirs.source_dir.join("a")).await?;
    fs::create_dir_all(test_dirs.source_dir.join("b")).await?;

    let detail = AlbumDetail {
        id: "404".to_string(),
        name: "Missing".to_string(),
        ..Default::default()
    };
    let result = resolve_album_dir(&test_dirs.source_dir, &detail, "metadata.json").await;
    assert!(matches!(result, Err(Error::AlbumDirNotFound { ref id, .. }) if id == "404"));

    let packed = Packer::default()
        .pack_from_detail(&detail, &test_dirs.source_dir, &test_dirs.target_dir)
        .await;
    assert!(!packed.is_success());
    assert!(matches!(
        packed.errors.as_slice(),
        [Error::AlbumDirNotFound { .. }]
    ));
    Ok(())
}

#[tokio::test]
async fn test_pack_from_detail() -> Result<()> {
    let test_dirs = setup_test_dirs("pack_from_detail").await;
    let album = test_dirs.source_dir.join("123456");
    create_pages(&album.join("第1话"), &["1.jpg"]).await;
    create_pages(&album.join("第2话"), &["1.jpg"]).await;

    let detail = AlbumDetail {
        id: "123456".to_string(),
        name: "From Detail".to_string(),
        episode_list: vec![Episode::default(), Episode::default()],
        ..Default::default()
    };
    let result = Packer::default()
        .pack_from_detail(&detail, &test_dirs.source_dir, &test_dirs.target_dir)
        .await;

    let series_dir = test_dirs.target_dir.join("From Detail");
    assert_eq!(
        result.archives,
        vec![
            series_dir.join("From Detail_c001.cbz"),
            series_dir.join("From Detail_c002.cbz"),
        ]
    );
    let xml = get_comic_info_xml(&result.archives[1]);
    assert!(xml.contains("<Number>2</Number>"));
    assert!(xml.contains("JMComic Album ID: 123456"));
    Ok(())
}

#[tokio::test]
async fn test_batch_counts_albums() -> Result<()> {
    let test_dirs = setup_test_dirs("batch").await;
    create_pages(&test_dirs.source_dir.join("Album A"), &["1.jpg"]).await;
    create_pages(&test_dirs.source_dir.join("Album B").join("第1话"), &["1.jpg"]).await;
    create_pages(&test_dirs.source_dir.join("Album B").join("第2话"), &["1.jpg"]).await;
    fs::create_dir_all(test_dirs.source_dir.join("Album C")).await?;
    // Loose files at the source root are not albums.
    fs::write(test_dirs.source_dir.join("notes.txt"), b"x").await?;

    let stats = timeout(
        LONG_TEST_TIMEOUT,
        pack_albums(&test_dirs.source_dir, &test_dirs.target_dir, true, 1),
    )
    .await
    .expect("Test timed out")?;

    assert_eq!(
        stats,
        BatchStats {
            success: 2,
            failed: 1,
            total: 3
        }
    );
    assert!(test_dirs.target_dir.join("Album A").join("Album A_c001.cbz").exists());
    assert!(test_dirs.target_dir.join("Album B").join("Album B_c002.cbz").exists());
    Ok(())
}

#[tokio::test]
async fn test_batch_on_missing_source() -> Result<()> {
    let test_dirs = setup_test_dirs("batch_missing_source").await;
    let stats = Packer::default()
        .pack_many(&test_dirs.source_dir.join("absent"), &test_dirs.target_dir)
        .await;
    assert_eq!(stats, BatchStats::default());
    Ok(())
}

#[tokio::test]
async fn test_free_functions_validate_level() -> Result<()> {
    let test_dirs = setup_test_dirs("free_functions").await;
    let album = test_dirs.source_dir.join("Lvl");
    create_pages(&album, &["1.jpg"]).await;

    assert!(pack_album(&album, &test_dirs.target_dir, true, 10).await.is_err());
    assert!(pack_albums(&test_dirs.source_dir, &test_dirs.target_dir, true, 10)
        .await
        .is_err());

    let result = pack_album(&album, &test_dirs.target_dir, true, 0).await?;
    assert!(result.is_success());
    Ok(())
}
