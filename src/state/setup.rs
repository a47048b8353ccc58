use super::AppState;
use crate::prefs::{self, SetupInput, KEY_IMPOSTERS, KEY_NAMES, KEY_STEALTH, KEY_TIMER};

impl AppState {
    pub async fn setup(&self) -> SetupInput {
        self.setup.read().await.clone()
    }

    /// Raw player list as typed, comma or newline separated
    pub async fn set_names_input(&self, names_raw: String) -> SetupInput {
        let setup = {
            let mut setup = self.setup.write().await;
            setup.names_raw = names_raw.clone();
            setup.clone()
        };
        prefs::persist(self.prefs.clone(), KEY_NAMES, names_raw).await;
        setup
    }

    pub async fn set_imposter_count(&self, count: u32) -> SetupInput {
        let setup = {
            let mut setup = self.setup.write().await;
            setup.imposter_count = prefs::normalize_imposter_count(count);
            setup.clone()
        };
        prefs::persist(
            self.prefs.clone(),
            KEY_IMPOSTERS,
            setup.imposter_count.to_string(),
        )
        .await;
        setup
    }

    pub async fn set_stealth(&self, enabled: bool) -> SetupInput {
        let setup = {
            let mut setup = self.setup.write().await;
            setup.stealth = enabled;
            setup.clone()
        };
        let value = if enabled { "1" } else { "0" };
        prefs::persist(self.prefs.clone(), KEY_STEALTH, value.to_string()).await;
        setup
    }

    pub async fn set_timer_seconds(&self, seconds: u32) -> SetupInput {
        let setup = {
            let mut setup = self.setup.write().await;
            setup.timer_seconds = prefs::normalize_timer_seconds(seconds);
            setup.clone()
        };
        tracing::debug!("Vote timer set to {}s", setup.timer_seconds);
        prefs::persist(
            self.prefs.clone(),
            KEY_TIMER,
            setup.timer_seconds.to_string(),
        )
        .await;
        setup
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::{MemoryPreferenceStore, PreferenceStore};
    use crate::timer::SilentAlert;
    use crate::types::SessionConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::{mpsc, Arc, Mutex};
    use std::time::Duration;

    /// Holds every write until the test lets it through
    struct GatedStore {
        gate: Mutex<mpsc::Receiver<()>>,
        inner: MemoryPreferenceStore,
    }

    impl PreferenceStore for GatedStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), prefs::PrefsError> {
            let _ = self.gate.lock().unwrap().recv();
            self.inner.set(key, value)
        }
    }

    fn state_with_store(store: Arc<MemoryPreferenceStore>) -> AppState {
        AppState::new_with(
            SessionConfig::default(),
            store,
            Arc::new(SilentAlert),
            StdRng::seed_from_u64(1),
        )
    }

    #[tokio::test]
    async fn test_setters_persist() {
        let store = Arc::new(MemoryPreferenceStore::new());
        let state = state_with_store(store.clone());

        state.set_names_input("Alex, Sam\nJamie".to_string()).await;
        state.set_imposter_count(2).await;
        state.set_stealth(true).await;
        state.set_timer_seconds(90).await;

        assert_eq!(store.get(KEY_NAMES).as_deref(), Some("Alex, Sam\nJamie"));
        assert_eq!(store.get(KEY_IMPOSTERS).as_deref(), Some("2"));
        assert_eq!(store.get(KEY_STEALTH).as_deref(), Some("1"));
        assert_eq!(store.get(KEY_TIMER).as_deref(), Some("90"));

        state.set_stealth(false).await;
        assert_eq!(store.get(KEY_STEALTH).as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn test_setup_readable_while_persisting() {
        let (release, gate) = mpsc::channel();
        let store = Arc::new(GatedStore {
            gate: Mutex::new(gate),
            inner: MemoryPreferenceStore::new(),
        });
        let state = AppState::new_with(
            SessionConfig::default(),
            store.clone(),
            Arc::new(SilentAlert),
            StdRng::seed_from_u64(1),
        );

        let writer = tokio::spawn({
            let state = state.clone();
            async move { state.set_names_input("Alex, Sam, Jamie".to_string()).await }
        });

        let setup = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let setup = state.setup().await;
                if setup.names_raw == "Alex, Sam, Jamie" {
                    break setup;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(setup.names_raw, "Alex, Sam, Jamie");
        assert!(store.get(KEY_NAMES).is_none());

        release.send(()).unwrap();
        writer.await.unwrap();
        assert_eq!(store.get(KEY_NAMES).as_deref(), Some("Alex, Sam, Jamie"));
    }

    #[tokio::test]
    async fn test_setters_normalise() {
        let state = AppState::new();

        assert_eq!(state.set_imposter_count(0).await.imposter_count, 1);
        assert_eq!(state.set_timer_seconds(2).await.timer_seconds, 5);
    }

    #[tokio::test]
    async fn test_setup_restored_from_store() {
        let store = Arc::new(MemoryPreferenceStore::new());
        store.set(KEY_NAMES, "Alex, Sam, Jamie").unwrap();
        store.set(KEY_TIMER, "45").unwrap();

        let state = state_with_store(store);
        let setup = state.setup().await;
        assert_eq!(setup.names_raw, "Alex, Sam, Jamie");
        assert_eq!(setup.timer_seconds, 45);
        assert_eq!(setup.imposter_count, 1);
        assert!(!setup.stealth);
    }
}
