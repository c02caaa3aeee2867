//! Choosing which repository files hold a split.

/// Parquet files of `split`, sorted.
///
/// A file belongs to the split when its name starts with `<split>-` or
/// `<split>.`, or when one of its parent directories is named `<split>`.
/// This covers both `data/train-00000-of-00002.parquet` and the Hub's
/// converted layout `default/train/0000.parquet`.
pub fn select_split_shards(files: &[String], split: &str) -> Vec<String> {
    let mut shards: Vec<String> = files
        .iter()
        .filter(|f| f.ends_with(".parquet"))
        .filter(|f| belongs_to_split(f, split))
        .cloned()
        .collect();
    shards.sort();
    shards
}

fn belongs_to_split(path: &str, split: &str) -> bool {
    let mut parts: Vec<&str> = path.split('/').collect();
    let file_name = parts.pop().unwrap_or_default();
    if parts.iter().any(|dir| *dir == split) {
        return true;
    }
    file_name
        .strip_prefix(split)
        .is_some_and(|rest| rest.starts_with('-') || rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn picks_push_to_hub_layout() {
        let repo = files(&[
            "README.md",
            ".gitattributes",
            "data/train-00001-of-00002.parquet",
            "data/train-00000-of-00002.parquet",
            "data/test-00000-of-00001.parquet",
        ]);
        assert_eq!(
            select_split_shards(&repo, "train"),
            vec!["data/train-00000-of-00002.parquet", "data/train-00001-of-00002.parquet"]
        );
        assert_eq!(select_split_shards(&repo, "test"), vec!["data/test-00000-of-00001.parquet"]);
    }

    #[test]
    fn picks_converted_layout() {
        let repo = files(&[
            "default/train/0000.parquet",
            "default/train/0001.parquet",
            "default/validation/0000.parquet",
        ]);
        assert_eq!(
            select_split_shards(&repo, "train"),
            vec!["default/train/0000.parquet", "default/train/0001.parquet"]
        );
    }

    #[test]
    fn ignores_similar_split_names_and_other_files() {
        let repo = files(&[
            "data/train_extra-00000.parquet",
            "data/training-00000.parquet",
            "data/train-00000.arrow",
            "train.parquet",
        ]);
        assert_eq!(select_split_shards(&repo, "train"), vec!["train.parquet"]);
    }

    #[test]
    fn nothing_matches() {
        assert!(select_split_shards(&files(&["audio/orca_1.wav"]), "train").is_empty());
    }
}
