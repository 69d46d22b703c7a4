pub mod gallery_dir;
