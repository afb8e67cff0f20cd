use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use fieldday_core::{AlertLedger, Clock, NewService, Service};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// `$FIELDDAY_HOME`, else `~/.fieldday`.
pub fn fieldday_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var("FIELDDAY_HOME")
        .ok()
        .filter(|d| !d.trim().is_empty())
    {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set (or set FIELDDAY_HOME)")?;
    Ok(PathBuf::from(home).join(".fieldday"))
}

pub fn ensure_fieldday_home() -> Result<PathBuf> {
    let dir = fieldday_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn services_path() -> Result<PathBuf> {
    Ok(ensure_fieldday_home()?.join("services.json"))
}

pub fn alerts_path() -> Result<PathBuf> {
    Ok(ensure_fieldday_home()?.join("alerts.json"))
}

/// JSON-array record store. Each command loads a snapshot, hands it to the
/// core, and writes the whole array back after a mutation.
#[derive(Debug, Clone, Default)]
pub struct ServiceStore {
    path: Option<PathBuf>,
    services: Vec<Service>,
}

impl ServiceStore {
    pub fn open() -> Result<Self> {
        Self::open_at(&services_path()?)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let services = if path.exists() {
            let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            if s.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?
            }
        } else {
            Vec::new()
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            services,
        })
    }

    #[cfg(test)]
    pub fn in_memory(services: Vec<Service>) -> Self {
        Self {
            path: None,
            services,
        }
    }

    pub fn snapshot(&self) -> &[Service] {
        &self.services
    }

    pub fn get(&self, id: &str) -> Result<&Service> {
        match self.services.iter().find(|s| s.id == id) {
            Some(s) => Ok(s),
            None => bail!("no service with id {id}"),
        }
    }

    /// Ids are `svc-<n>`, one above the highest number in use.
    pub fn next_id(&self) -> String {
        let max = self
            .services
            .iter()
            .filter_map(|s| s.id.strip_prefix("svc-"))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("svc-{}", max + 1)
    }

    pub fn insert(&mut self, new: NewService) -> Result<String> {
        new.validate()?;
        let id = self.next_id();
        self.services.push(new.into_service(id.clone()));
        Ok(id)
    }

    /// Replace the stored record with the same id.
    pub fn replace(&mut self, service: Service) -> Result<()> {
        service.validate()?;
        match self.services.iter_mut().find(|s| s.id == service.id) {
            Some(slot) => {
                *slot = service;
                Ok(())
            }
            None => bail!("no service with id {}", service.id),
        }
    }

    pub fn remove(&mut self, id: &str) -> Result<Service> {
        match self.services.iter().position(|s| s.id == id) {
            Some(i) => Ok(self.services.remove(i)),
            None => bail!("no service with id {id}"),
        }
    }

    /// Drop every record dated within `[first, last]` and hand them back.
    pub fn remove_between(&mut self, first: NaiveDate, last: NaiveDate) -> Vec<Service> {
        let (gone, kept): (Vec<Service>, Vec<Service>) = std::mem::take(&mut self.services)
            .into_iter()
            .partition(|s| s.service_date >= first && s.service_date <= last);
        self.services = kept;
        gone
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.services)?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}

/// Alert dismissals persisted as a flat JSON object.
#[derive(Debug, Clone, Default)]
pub struct FileLedger {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileLedger {
    pub fn open() -> Result<Self> {
        let path = alerts_path()?;
        let entries = if path.exists() {
            let s = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json).with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }
}

impl AlertLedger for FileLedger {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Wall clock in the profile timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    pub tz: Tz,
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn new_service(client: &str) -> NewService {
        NewService::new(
            client,
            NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            60,
        )
    }

    #[test]
    fn test_ids_continue_after_highest() {
        let mut store = ServiceStore::in_memory(vec![]);
        assert_eq!(store.insert(new_service("A")).unwrap(), "svc-1");
        assert_eq!(store.insert(new_service("B")).unwrap(), "svc-2");

        let mut gap = ServiceStore::in_memory(vec![
            new_service("X").into_service("svc-7"),
            new_service("Y").into_service("legacy-id"),
        ]);
        assert_eq!(gap.insert(new_service("Z")).unwrap(), "svc-8");
    }

    #[test]
    fn test_insert_rejects_invalid() {
        let mut store = ServiceStore::in_memory(vec![]);
        let mut bad = new_service("A");
        bad.duration_minutes = 0;
        assert!(store.insert(bad).is_err());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_replace_unknown_id_fails() {
        let mut store = ServiceStore::in_memory(vec![new_service("A").into_service("svc-1")]);
        let mut s = store.get("svc-1").unwrap().clone();
        s.notes = "checked rinse arm".into();
        store.replace(s).unwrap();
        assert_eq!(store.get("svc-1").unwrap().notes, "checked rinse arm");

        assert!(store.replace(new_service("B").into_service("svc-9")).is_err());
        assert!(store.get("svc-9").is_err());
    }

    #[test]
    fn test_remove_between_keeps_other_months() {
        let day = |m, d| NaiveDate::from_ymd_opt(2026, m, d).unwrap();
        let at = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let mut store = ServiceStore::in_memory(vec![
            NewService::new("A", day(9, 30), at, 60).into_service("svc-1"),
            NewService::new("B", day(10, 1), at, 60).into_service("svc-2"),
            NewService::new("C", day(10, 30), at, 60).into_service("svc-3"),
            NewService::new("D", day(11, 2), at, 60).into_service("svc-4"),
        ]);
        let gone = store.remove_between(day(10, 1), day(10, 31));
        let gone_ids: Vec<&str> = gone.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(gone_ids, vec!["svc-2", "svc-3"]);
        let left: Vec<&str> = store.snapshot().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(left, vec!["svc-1", "svc-4"]);

        assert_eq!(store.remove("svc-4").unwrap().client_name, "D");
        assert!(store.remove("svc-4").is_err());
    }
}
