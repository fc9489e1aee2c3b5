//! Reachability tracking for imported references across weak collections
//! and virtual-object state.

use alder_runtime::{
    CapValue, KindDefinition, Presence, Runtime, RuntimeConfig, ScalarKey, StateRecord, Vref,
};

fn key_kind() -> KindDefinition {
    // empty object, used as a weak map store key
    KindDefinition::new("key", |_args| StateRecord::new())
}

fn holder_kind() -> KindDefinition {
    KindDefinition::new("holder", |args| {
        StateRecord::from_fields([("held", args.first().cloned().unwrap_or(CapValue::Null))])
    })
    .with_method("setHeld", |state, args| {
        state.set("held", args.first().cloned().unwrap_or(CapValue::Null));
        Ok(CapValue::Null)
    })
    .with_method("getHeld", |state, _args| {
        Ok(state.get("held").cloned().unwrap_or(CapValue::Null))
    })
}

/// Mints import presences the way they arrive from another trust domain:
/// fresh import vref, registered but not yet stored anywhere.
struct PresenceMinter {
    count: u64,
}

impl PresenceMinter {
    fn new() -> Self {
        Self { count: 1001 }
    }

    fn mint(&mut self, runtime: &Runtime) -> (Vref, Presence) {
        let vref = Vref::Import(self.count);
        let presence = Presence::new(vref.clone(), format!("presence-{}", self.count));
        runtime.register_entry(&vref, presence.clone()).unwrap();
        self.count += 1;
        (vref, presence)
    }
}

#[tokio::test]
async fn tracks_reachable_vrefs() {
    let runtime = Runtime::in_memory(RuntimeConfig { cache_size: 3 }).unwrap();
    let weak_store = runtime.make_weak_map("test").await.unwrap();
    let make_key = runtime.define_kind(key_kind()).unwrap();
    let make_holder = runtime.define_kind(holder_kind()).unwrap();
    let mut minter = PresenceMinter::new();

    // a weak map value anchors the presence stored in it
    let (vref1, obj1) = minter.mint(&runtime);
    let key1 = make_key.create(&[]).await.unwrap();
    assert!(!runtime.is_presence_reachable(&vref1));
    weak_store
        .init(ScalarKey::Ref(key1.vref().clone()), CapValue::from(&obj1))
        .await
        .unwrap();
    assert!(runtime.is_presence_reachable(&vref1));

    // overwriting a placeholder flips reachability at exactly that call
    let (vref2, obj2) = minter.mint(&runtime);
    let key2 = make_key.create(&[]).await.unwrap();
    weak_store
        .init(ScalarKey::Ref(key2.vref().clone()), CapValue::from("not yet"))
        .await
        .unwrap();
    assert!(!runtime.is_presence_reachable(&vref2));
    weak_store
        .set(ScalarKey::Ref(key2.vref().clone()), CapValue::from(&obj2))
        .await
        .unwrap();
    assert!(runtime.is_presence_reachable(&vref2));

    // presences are tracked when in the state of a virtual object,
    // stored through a constructor argument
    let (vref3, obj3) = minter.mint(&runtime);
    assert!(!runtime.is_presence_reachable(&vref3));
    let _holder3 = make_holder.create(&[CapValue::from(&obj3)]).await.unwrap();
    assert!(runtime.is_presence_reachable(&vref3));

    // and stored through a mutating method
    let (vref4, obj4) = minter.mint(&runtime);
    let holder4 = make_holder.create(&[CapValue::from("not yet")]).await.unwrap();
    assert!(!runtime.is_presence_reachable(&vref4));
    holder4
        .invoke("setHeld", &[CapValue::from(&obj4)])
        .await
        .unwrap();
    assert!(runtime.is_presence_reachable(&vref4));
}

#[tokio::test]
async fn unregistered_presences_are_not_reachable() {
    let runtime = Runtime::in_memory(RuntimeConfig { cache_size: 3 }).unwrap();
    assert!(!runtime.is_presence_reachable(&Vref::Import(9999)));
}

#[tokio::test]
async fn registration_alone_does_not_anchor() {
    let runtime = Runtime::in_memory(RuntimeConfig { cache_size: 3 }).unwrap();
    let mut minter = PresenceMinter::new();
    let (vref, _presence) = minter.mint(&runtime);
    assert!(!runtime.is_presence_reachable(&vref));
}

#[tokio::test]
async fn registration_is_idempotent() {
    let runtime = Runtime::in_memory(RuntimeConfig { cache_size: 3 }).unwrap();
    let vref = Vref::Import(1001);
    let presence = Presence::new(vref.clone(), "presence-1001");
    runtime.register_entry(&vref, presence.clone()).unwrap();
    runtime.register_entry(&vref, presence.clone()).unwrap();
    assert!(!runtime.is_presence_reachable(&vref));
    assert_eq!(runtime.presence(&vref), Some(presence));
}

#[tokio::test]
async fn reachability_survives_residency_transitions() {
    let runtime = Runtime::in_memory(RuntimeConfig { cache_size: 3 }).unwrap();
    let make_holder = runtime.define_kind(holder_kind()).unwrap();
    let mut minter = PresenceMinter::new();

    let (vref, obj) = minter.mint(&runtime);
    let holder = make_holder.create(&[CapValue::from(&obj)]).await.unwrap();
    assert!(runtime.is_presence_reachable(&vref));

    // push the holder out of the working set
    for _ in 0..3 {
        make_holder.create(&[CapValue::Null]).await.unwrap();
    }
    assert!(!runtime.objects().is_resident(holder.vref()).await);
    assert!(runtime.is_presence_reachable(&vref));

    // rematerialize and check again
    assert_eq!(
        holder.invoke("getHeld", &[]).await.unwrap(),
        CapValue::from(&obj)
    );
    assert!(runtime.objects().is_resident(holder.vref()).await);
    assert!(runtime.is_presence_reachable(&vref));
}

#[tokio::test]
async fn all_anchors_must_go_before_unreachable() {
    let runtime = Runtime::in_memory(RuntimeConfig { cache_size: 3 }).unwrap();
    let weak_store = runtime.make_weak_map("test").await.unwrap();
    let make_holder = runtime.define_kind(holder_kind()).unwrap();
    let mut minter = PresenceMinter::new();

    let (vref, obj) = minter.mint(&runtime);
    weak_store
        .init(ScalarKey::from("slot"), CapValue::from(&obj))
        .await
        .unwrap();
    let holder = make_holder.create(&[CapValue::from(&obj)]).await.unwrap();
    assert!(runtime.is_presence_reachable(&vref));

    weak_store.delete(&ScalarKey::from("slot")).await.unwrap();
    // still anchored by the holder's state
    assert!(runtime.is_presence_reachable(&vref));

    holder
        .invoke("setHeld", &[CapValue::from("nothing")])
        .await
        .unwrap();
    assert!(!runtime.is_presence_reachable(&vref));

    // the import lost its last anchor and is due a drop notification
    assert_eq!(runtime.take_droppable(), vec![vref]);
    assert!(runtime.take_droppable().is_empty());
}

#[tokio::test]
async fn externally_rooted_presences_stay_reachable() {
    let runtime = Runtime::in_memory(RuntimeConfig { cache_size: 3 }).unwrap();
    let mut minter = PresenceMinter::new();
    let (vref, _obj) = minter.mint(&runtime);

    runtime.set_rooted(&vref, true);
    assert!(runtime.is_presence_reachable(&vref));

    runtime.set_rooted(&vref, false);
    assert!(!runtime.is_presence_reachable(&vref));
}

#[tokio::test]
async fn anchors_in_swapped_out_state_are_scanned() {
    // a holder that is swapped out the whole time still anchors its held
    // presence; dropping the anchor requires rematerializing and mutating
    let runtime = Runtime::in_memory(RuntimeConfig { cache_size: 1 }).unwrap();
    let make_holder = runtime.define_kind(holder_kind()).unwrap();
    let mut minter = PresenceMinter::new();

    let (vref, obj) = minter.mint(&runtime);
    let holder = make_holder.create(&[CapValue::from(&obj)]).await.unwrap();

    // evict immediately by creating another instance
    let _other = make_holder.create(&[CapValue::Null]).await.unwrap();
    assert!(!runtime.objects().is_resident(holder.vref()).await);
    assert!(runtime.is_presence_reachable(&vref));

    holder
        .invoke("setHeld", &[CapValue::Null])
        .await
        .unwrap();
    assert!(!runtime.is_presence_reachable(&vref));
}
