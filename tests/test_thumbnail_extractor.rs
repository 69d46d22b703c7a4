use facematch::config::Settings;
use facematch::domain::error::DomainError;
use facematch::domain::ports::feature_extractor::FeatureExtractor;
use facematch::infrastructure::extractors::thumbnail::ThumbnailExtractor;
use facematch::FaceMatch;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::Arc;

fn png(img: RgbImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn horizontal_gradient(size: u32) -> Vec<u8> {
    png(RgbImage::from_fn(size, size, |x, _| {
        let v = (x * 255 / (size - 1)) as u8;
        image::Rgb([v, v, v])
    }))
}

fn vertical_gradient(size: u32) -> Vec<u8> {
    png(RgbImage::from_fn(size, size, |_, y| {
        let v = (y * 255 / (size - 1)) as u8;
        image::Rgb([v, v / 2, 255 - v])
    }))
}

#[tokio::test]
async fn test_embedding_is_normalized_and_deterministic() {
    let extractor = ThumbnailExtractor;
    let img = horizontal_gradient(64);

    let a = extractor.extract(&img).await.unwrap();
    let b = extractor.extract(&img).await.unwrap();
    assert_eq!(a.len(), ThumbnailExtractor::DIMENSION);
    assert_eq!(a, b);

    let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-4, "norm {norm}");
}

#[tokio::test]
async fn test_corrupt_and_featureless_images_fail() {
    let extractor = ThumbnailExtractor;

    let err = extractor.extract(b"definitely not a png").await.unwrap_err();
    assert!(matches!(err, DomainError::Extraction(_)));

    let uniform = png(RgbImage::from_pixel(32, 32, image::Rgb([120, 120, 120])));
    let err = extractor.extract(&uniform).await.unwrap_err();
    assert!(matches!(err, DomainError::Extraction(_)));

    let tiny = horizontal_gradient(4);
    let err = extractor.extract(&tiny).await.unwrap_err();
    assert!(matches!(err, DomainError::Extraction(_)));
}

#[tokio::test]
async fn test_gallery_round_trip_with_real_images() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("horizontal.png"), horizontal_gradient(48)).unwrap();
    std::fs::write(dir.path().join("vertical.png"), vertical_gradient(48)).unwrap();

    let settings = Settings {
        gallery_dir: dir.path().to_path_buf(),
        ..Settings::default()
    };
    let fm = FaceMatch::with_extractor(settings, Arc::new(ThumbnailExtractor)).unwrap();
    let report = fm.load().await.unwrap();
    assert_eq!(report.loaded, 2);

    let result = fm.verify(&vertical_gradient(48)).await.unwrap();
    assert!(result.matched);
    assert_eq!(result.identity.unwrap().as_str(), "vertical");
    assert_eq!(result.distance, Some(0.0));

    let enrollment = fm.enroll("diag", &vertical_gradient(96)).await.unwrap();
    assert!(enrollment.path.ends_with("diag.png"));
}
