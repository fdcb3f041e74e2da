use anyhow::{Context, Result};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use super::model::DialConfig;

const CONFIG_FILE_NAME: &str = "dial-config.json";

fn join_default_path(base: &Path) -> PathBuf {
    let mut p = base.to_path_buf();
    p.push(CONFIG_FILE_NAME);
    p
}

/// 从基目录加载拨号配置；文件缺失时写出默认配置并返回默认值。
pub fn load_or_init(base_dir: &Path) -> Result<DialConfig> {
    load_or_init_at_path(&join_default_path(base_dir))
}

pub fn save(cfg: &DialConfig, base_dir: &Path) -> Result<()> {
    save_at_path(cfg, &join_default_path(base_dir))
}

pub fn load_or_init_at_path(path: &Path) -> Result<DialConfig> {
    if path.exists() {
        let data = fs::read(path).with_context(|| format!("read config: {}", path.display()))?;
        let cfg: DialConfig = serde_json::from_slice(&data).context("parse config json")?;
        Ok(cfg)
    } else {
        let cfg = DialConfig::default();
        save_at_path(&cfg, path)?;
        Ok(cfg)
    }
}

pub fn save_at_path(cfg: &DialConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok();
    }
    let json = serde_json::to_string_pretty(cfg).context("serialize config")?;
    let mut f =
        fs::File::create(path).with_context(|| format!("create config: {}", path.display()))?;
    f.write_all(json.as_bytes()).context("write config")?;
    tracing::info!(target = "config", path = %path.display(), "dial config saved");
    Ok(())
}
