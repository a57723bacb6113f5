//! TTLキャッシュ
//!
//! プロセス内で共有される期限付きキー・バリューストア。
//! 鮮度は読み出し時に遅延評価し、バックグラウンドでの掃除は行わない。
//!
//! キーごとに非同期ロックを持ち、`get_or_refresh` は「鮮度確認 → 必要なら取得 → 書き込み」を
//! 同一キーについて直列化する（シングルフライト）。異なるキー同士は互いにブロックしない。

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

/// キャッシュエントリ
///
/// 書き込みごとに新しく作られ、置き換えられる。
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// 値
    pub value: V,
    /// 格納時刻
    pub stored_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    /// 経過時間
    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }

    /// `now - stored_at < ttl` のとき新鮮
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}

/// 読み出し結果
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<V> {
    /// 値（期限切れでも返す）
    pub value: V,
    /// 新鮮か
    pub fresh: bool,
}

type Slot<V> = Arc<Mutex<Option<CacheEntry<V>>>>;

/// 期限付きキャッシュ
#[derive(Debug)]
pub struct TtlCache<K, V> {
    default_ttl: Duration,
    slots: Arc<RwLock<HashMap<K, Slot<V>>>>,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            default_ttl: self.default_ttl,
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// 新しいキャッシュを作成
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            slots: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 既定のTTL
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    async fn slot(&self, key: &K) -> Slot<V> {
        if let Some(slot) = self.slots.read().await.get(key) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().await;
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// 既定TTLで値と鮮度を取得
    pub async fn get(&self, key: &K) -> Option<Lookup<V>> {
        self.get_with_ttl(key, self.default_ttl).await
    }

    /// 指定TTLで値と鮮度を取得
    pub async fn get_with_ttl(&self, key: &K, ttl: Duration) -> Option<Lookup<V>> {
        let slot = self.slots.read().await.get(key).cloned()?;
        let entry = slot.lock().await;
        entry.as_ref().map(|entry| Lookup {
            value: entry.value.clone(),
            fresh: entry.is_fresh(ttl),
        })
    }

    /// 無条件に上書きし、格納時刻をリセットする
    pub async fn set(&self, key: K, value: V) {
        let slot = self.slot(&key).await;
        *slot.lock().await = Some(CacheEntry::new(value));
    }

    /// 新鮮な値があればそれを返し、なければ `refresh` を実行して書き込む
    ///
    /// 戻り値の `bool` はキャッシュから返したかどうか。
    /// 同一キーの呼び出しは直列化されるため、TTL内の取得は高々1回になる。
    pub async fn get_or_refresh<F, Fut>(&self, key: K, ttl: Duration, refresh: F) -> (V, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let slot = self.slot(&key).await;
        let mut entry = slot.lock().await;
        if let Some(current) = entry.as_ref() {
            if current.is_fresh(ttl) {
                return (current.value.clone(), true);
            }
        }
        let value = refresh().await;
        *entry = Some(CacheEntry::new(value.clone()));
        (value, false)
    }

    /// 保持しているキー数（期限切れを含む）
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    /// 空か
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
