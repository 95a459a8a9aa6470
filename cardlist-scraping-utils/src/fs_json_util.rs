use std::{
    fmt::Debug,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use anyhow::Context;
use fs_err::File;
use serde::{de::DeserializeOwned, Serialize};

fn read_with<T>(path: &Path, parse: impl FnOnce(&Path) -> anyhow::Result<T>) -> anyhow::Result<T> {
    parse(path).with_context(|| {
        format!(
            "While trying to parse {path:?} as {}",
            std::any::type_name::<T>()
        )
    })
}

pub fn read_json<P: Into<PathBuf> + Debug, T: DeserializeOwned>(path: P) -> anyhow::Result<T> {
    let path: PathBuf = path.into();
    read_with(&path, |path| {
        Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
    })
}

/// Like [`read_json`], but a missing file yields `T::default()`.
pub fn read_json_or_default<P: Into<PathBuf> + Debug, T: DeserializeOwned + Default>(
    path: P,
) -> anyhow::Result<T> {
    let path = path.into();
    if path.exists() {
        read_json(path)
    } else {
        Ok(T::default())
    }
}

pub fn write_json<P: Into<PathBuf>, T: Serialize>(path: P, value: &T) -> anyhow::Result<()> {
    Ok(serde_json::to_writer_pretty(
        BufWriter::new(File::create(path)?),
        value,
    )?)
}

pub fn read_toml<P: Into<PathBuf> + Debug, T: DeserializeOwned>(path: P) -> anyhow::Result<T> {
    let path: PathBuf = path.into();
    read_with(&path, |path| {
        Ok(toml::from_str(&fs_err::read_to_string(path)?)?)
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{read_json, read_json_or_default, read_toml, write_json};

    #[test]
    fn test_json_file_and_missing_file() {
        let dir = std::env::temp_dir().join(format!("cardlist-fs-{}", std::process::id()));
        fs_err::create_dir_all(&dir).unwrap();
        let path = dir.join("store.json");

        let missing: BTreeMap<String, u32> = read_json_or_default(dir.join("absent.json")).unwrap();
        assert!(missing.is_empty());

        let value = BTreeMap::from([("LOB".to_owned(), 3u32)]);
        write_json(&path, &value).unwrap();
        let back: BTreeMap<String, u32> = read_json(&path).unwrap();
        assert_eq!(back, value);

        fs_err::write(&path, "not json").unwrap();
        let err = read_json::<_, BTreeMap<String, u32>>(&path).unwrap_err();
        assert!(err.to_string().contains("While trying to parse"));

        let toml_path = dir.join("config.toml");
        fs_err::write(&toml_path, "timeout_secs = 3\n").unwrap();
        let config: BTreeMap<String, u32> = read_toml(&toml_path).unwrap();
        assert_eq!(config["timeout_secs"], 3);

        fs_err::remove_dir_all(&dir).unwrap();
    }
}
