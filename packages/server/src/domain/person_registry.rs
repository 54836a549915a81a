//! Presence records of a room, keyed by identity.

use super::{
    entity::Person,
    error::AuthorizationError,
    value_object::{Identity, Title},
};

/// Known persons of one room, in first-seen order.
///
/// Records outlive connections: they describe who an identity is, not
/// whether it is online.
#[derive(Debug, Clone, Default)]
pub struct PersonRegistry {
    persons: Vec<Person>,
}

impl PersonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from persisted records, keeping the last record
    /// when an identity appears twice.
    pub fn from_persons(persons: Vec<Person>) -> Self {
        let mut registry = Self::new();
        for person in persons {
            match registry.position(&person.identity) {
                Some(index) => registry.persons[index] = person,
                None => registry.persons.push(person),
            }
        }
        registry
    }

    /// Fetch the record of `identity`, creating it with the default title if
    /// it has never been seen.
    ///
    /// # Returns
    ///
    /// The person and whether it was created by this call
    pub fn handshake(&mut self, identity: &Identity) -> (Person, bool) {
        if let Some(person) = self.get(identity) {
            return (person.clone(), false);
        }
        let person = Person::with_default_title(identity.clone());
        self.persons.push(person.clone());
        (person, true)
    }

    /// Insert or replace a record on behalf of `authorized`.
    ///
    /// # Returns
    ///
    /// Whether the registry changed
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationError::IdentityMismatch` when `authorized` is not
    /// the owner of `person.identity`; the registry is left untouched.
    pub fn upsert(
        &mut self,
        person: Person,
        authorized: &Identity,
    ) -> Result<bool, AuthorizationError> {
        if &person.identity != authorized {
            return Err(AuthorizationError::IdentityMismatch {
                signer: authorized.to_string(),
                claimed: person.identity.to_string(),
            });
        }
        match self.position(&person.identity) {
            Some(index) if self.persons[index] == person => Ok(false),
            Some(index) => {
                self.persons[index] = person;
                Ok(true)
            }
            None => {
                self.persons.push(person);
                Ok(true)
            }
        }
    }

    /// Title a `PERSON` update should apply: the submitted one, else the
    /// stored one, else the default.
    pub fn resolve_title(&self, identity: &Identity, submitted: Option<Title>) -> Title {
        submitted
            .or_else(|| self.get(identity).map(|p| p.title.clone()))
            .unwrap_or_else(|| identity.default_title())
    }

    pub fn get(&self, identity: &Identity) -> Option<&Person> {
        self.persons.iter().find(|p| &p.identity == identity)
    }

    pub fn list(&self) -> &[Person] {
        &self.persons
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    fn position(&self, identity: &Identity) -> Option<usize> {
        self.persons.iter().position(|p| &p.identity == identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(value: &str) -> Identity {
        Identity::new(value.to_string()).unwrap()
    }

    fn title(value: &str) -> Title {
        Title::new(value.to_string()).unwrap()
    }

    #[test]
    fn test_handshake_creates_default_person() {
        // テスト項目: 未知の identity のハンドシェイクで既定タイトルの Person が作られる
        // given (前提条件):
        let mut registry = PersonRegistry::new();

        // when (操作):
        let (person, created) = registry.handshake(&identity("abcdef123"));

        // then (期待する結果):
        assert!(created);
        assert_eq!(person.title.as_str(), "abcd");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_handshake_returns_stored_person() {
        // テスト項目: 既知の identity のハンドシェイクは保存済みの Person を返す
        // given (前提条件):
        let mut registry = PersonRegistry::from_persons(vec![Person::new(
            identity("abcdef123"),
            title("alice"),
        )]);

        // when (操作):
        let (person, created) = registry.handshake(&identity("abcdef123"));

        // then (期待する結果):
        assert!(!created);
        assert_eq!(person.title.as_str(), "alice");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_upsert_by_owner_replaces_title() {
        // テスト項目: 本人による更新はタイトルを置き換える
        // given (前提条件):
        let mut registry = PersonRegistry::new();
        let alice = identity("alice-key");
        registry.handshake(&alice);

        // when (操作):
        let changed = registry
            .upsert(Person::new(alice.clone(), title("Alice")), &alice)
            .unwrap();

        // then (期待する結果):
        assert!(changed);
        assert_eq!(registry.get(&alice).unwrap().title.as_str(), "Alice");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_upsert_inserts_unknown_person() {
        // テスト項目: 未登録の本人による更新は新規追加になる
        let mut registry = PersonRegistry::new();
        let alice = identity("alice-key");

        let changed = registry
            .upsert(Person::new(alice.clone(), title("Alice")), &alice)
            .unwrap();

        assert!(changed);
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn test_upsert_same_record_reports_no_change() {
        // テスト項目: 同一内容の更新は変更なしとして報告される
        let mut registry = PersonRegistry::new();
        let alice = identity("alice-key");
        registry
            .upsert(Person::new(alice.clone(), title("Alice")), &alice)
            .unwrap();

        let changed = registry
            .upsert(Person::new(alice.clone(), title("Alice")), &alice)
            .unwrap();

        assert!(!changed);
    }

    #[test]
    fn test_upsert_by_other_identity_is_rejected() {
        // テスト項目: 他人の identity を書き換えようとすると拒否され、登録内容は変わらない
        // given (前提条件):
        let mut registry = PersonRegistry::new();
        let alice = identity("alice-key");
        let mallory = identity("mallory-key");
        registry.handshake(&alice);
        let before = registry.list().to_vec();

        // when (操作):
        let result = registry.upsert(Person::new(alice.clone(), title("pwned")), &mallory);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(AuthorizationError::IdentityMismatch {
                signer: "mallory-key".to_string(),
                claimed: "alice-key".to_string(),
            })
        );
        assert_eq!(registry.list(), before.as_slice());
    }

    #[test]
    fn test_resolve_title_fallbacks() {
        // テスト項目: タイトル省略時は保存済み、未登録なら既定タイトルが使われる
        let mut registry = PersonRegistry::new();
        let alice = identity("alice-key");
        registry
            .upsert(Person::new(alice.clone(), title("Alice")), &alice)
            .unwrap();

        assert_eq!(registry.resolve_title(&alice, None).as_str(), "Alice");
        assert_eq!(
            registry.resolve_title(&alice, Some(title("A."))).as_str(),
            "A."
        );
        assert_eq!(
            registry.resolve_title(&identity("bob-key"), None).as_str(),
            "bob-"
        );
    }

    #[test]
    fn test_from_persons_deduplicates_identities() {
        // テスト項目: 永続化データに重複 identity があれば後勝ちで 1 件にまとめる
        let registry = PersonRegistry::from_persons(vec![
            Person::new(identity("k"), title("old")),
            Person::new(identity("k"), title("new")),
        ]);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.list()[0].title.as_str(), "new");
    }
}
