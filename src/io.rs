//! External diagram import and export. The exact wire format of any
//! foreign BDD-file is explicitly out of scope, so this module defines
//! and reads/writes back this crate's own stable binary node layout
//! rather than imitating anyone else's format. A node is a 4-byte
//! variable number followed by two 8-byte packed arcs (this crate's own
//! `Arc` bit layout, little-endian); node index 0 is the reserved
//! sentinel, same as `store.rs`. Adapted from bex's unsafe
//! slice-as-bytes `io.rs`, but built on `std::io::{Read, Write}` so it
//! works over any stream, not just a file opened by path.

use std::collections::HashMap;
use std::io::{Read, Write};

use fxhash::FxBuildHasher;

use crate::arc::Arc;
use crate::engine::Engine;
use crate::error::{DdError, DdResult};

const MAGIC: [u8; 4] = *b"DUOD";
const VERSION: u32 = 1;

fn read_u32(r: &mut impl Read) -> DdResult<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(r: &mut impl Read) -> DdResult<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn write_u32(w: &mut impl Write, v: u32) -> DdResult<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_u64(w: &mut impl Write, v: u64) -> DdResult<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Imports a diagram previously written in this crate's node format,
/// returning its root arc. Imported nodes bypass `find_or_create`'s
/// reduction (the file is trusted to already be reduced) but are still
/// registered in the engine's own store, so later `apply_bdd`/`apply_zdd`
/// calls can reference the result normally.
pub fn import_from_external(engine: &mut Engine, r: &mut impl Read) -> DdResult<Arc> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(DdError::SerializationError(format!(
            "bad magic: expected {MAGIC:?}, got {magic:?}"
        )));
    }
    let version = read_u32(r)?;
    if version != VERSION {
        return Err(DdError::SerializationError(format!("unsupported format version {version}")));
    }
    let node_count = read_u64(r)?;
    let root_bits = read_u64(r)?;

    let mut remap: Vec<Arc> = vec![Arc::from_bits(0)];
    for file_ix in 1..node_count {
        let var = read_u32(r)?;
        let low_bits = read_u64(r)?;
        let high_bits = read_u64(r)?;
        let low = remap_arc(&remap, low_bits, file_ix)?;
        let high = remap_arc(&remap, high_bits, file_ix)?;
        let arc = engine.register_imported(var, low, high)?;
        remap.push(arc);
    }
    remap_arc(&remap, root_bits, node_count)
}

/// Resolves a file-local arc (referring to nodes by their position in the
/// file) against `remap`, the file-index -> engine-arc table built so
/// far. Only backward references are legal: a node must be fully read
/// before anything can point to it.
fn remap_arc(remap: &[Arc], bits: u64, at_file_ix: u64) -> DdResult<Arc> {
    let arc = Arc::from_bits(bits);
    if arc.is_terminal() {
        return Ok(arc);
    }
    let file_ix = arc.index();
    if file_ix >= at_file_ix || file_ix as usize >= remap.len() {
        return Err(DdError::SerializationError(format!(
            "arc at file index {at_file_ix} refers to unseen node {file_ix}"
        )));
    }
    let resolved = remap[file_ix as usize];
    Ok(if arc.is_complemented() { resolved.negated() } else { resolved })
}

/// Writes `root` (and every node it transitively reaches) to `w` in this
/// crate's node format. A post-order walk numbers each node only after
/// both its children have been numbered, which is exactly what
/// [`import_from_external`] requires: every arc in the file refers
/// backward to a node already written.
pub fn export_to_external(engine: &Engine, root: Arc, w: &mut impl Write) -> DdResult<()> {
    let mut file_index: HashMap<u64, u64, FxBuildHasher> = HashMap::default();
    let mut records: Vec<(u32, u64, u64)> = Vec::new();
    assign_file_indices(engine, root, &mut file_index, &mut records)?;
    let root_bits = remap_to_file_bits(&file_index, root)?;

    w.write_all(&MAGIC)?;
    write_u32(w, VERSION)?;
    write_u64(w, records.len() as u64 + 1)?; // + reserved sentinel
    write_u64(w, root_bits)?;
    for (var, low_bits, high_bits) in records {
        write_u32(w, var)?;
        write_u64(w, low_bits)?;
        write_u64(w, high_bits)?;
    }
    Ok(())
}

/// Rewrites an engine-local arc as a file-local one: terminals pass
/// through unchanged, node arcs are renumbered through `file_index`.
fn remap_to_file_bits(file_index: &HashMap<u64, u64, FxBuildHasher>, arc: Arc) -> DdResult<u64> {
    if arc.is_terminal() {
        return Ok(arc.bits());
    }
    let store_ix = arc.without_complement().index();
    let file_ix = *file_index
        .get(&store_ix)
        .ok_or_else(|| DdError::SerializationError("node missing from export index".into()))?;
    Ok(Arc::node(file_ix, arc.is_complemented()).bits())
}

fn assign_file_indices(
    engine: &Engine,
    arc: Arc,
    file_index: &mut HashMap<u64, u64, FxBuildHasher>,
    records: &mut Vec<(u32, u64, u64)>,
) -> DdResult<()> {
    if arc.is_terminal() {
        return Ok(());
    }
    let store_ix = arc.without_complement().index();
    if file_index.contains_key(&store_ix) {
        return Ok(());
    }
    let node = *engine.node(arc);
    assign_file_indices(engine, node.low, file_index, records)?;
    assign_file_indices(engine, node.high, file_index, records)?;
    let low_bits = remap_to_file_bits(file_index, node.low)?;
    let high_bits = remap_to_file_bits(file_index, node.high)?;
    let file_ix = records.len() as u64 + 1;
    file_index.insert(store_ix, file_ix);
    records.push((node.var, low_bits, high_bits));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply_bdd::or;
    use crate::arc::T1;

    fn two_var_bdd() -> (Engine, Arc, u32, u32) {
        let mut engine = Engine::new();
        let x = engine.new_variable().unwrap();
        let y = engine.new_variable().unwrap();
        let vx = engine.var_bdd(x).unwrap();
        let vy = engine.var_bdd(y).unwrap();
        let f = or(&mut engine, vx, vy).unwrap(); // var2 OR var1
        (engine, f, x, y)
    }

    #[test]
    fn export_then_import_round_trips_node_structure() {
        let (engine, f, x, y) = two_var_bdd();
        let mut bytes = Vec::new();
        export_to_external(&engine, f, &mut bytes).unwrap();

        let mut imported = Engine::new();
        let root = import_from_external(&mut imported, &mut bytes.as_slice()).unwrap();
        let node = imported.node(root);
        assert_eq!(node.var, y);
        assert_eq!(node.high, T1);
        assert_eq!(imported.node(node.low).var, x);
    }

    #[test]
    fn export_then_import_preserves_satisfying_count() {
        let (engine, f, _x, _y) = two_var_bdd();
        let mut bytes = Vec::new();
        export_to_external(&engine, f, &mut bytes).unwrap();

        let mut imported = Engine::new();
        let root = import_from_external(&mut imported, &mut bytes.as_slice()).unwrap();
        assert_eq!(
            crate::solve::count_sat_bdd(&engine, f, 2).unwrap(),
            crate::solve::count_sat_bdd(&imported, root, 2).unwrap(),
        );
    }

    #[test]
    fn import_rejects_bad_magic() {
        let (engine, f, ..) = two_var_bdd();
        let mut bytes = Vec::new();
        export_to_external(&engine, f, &mut bytes).unwrap();
        bytes[0] = b'X';
        let mut fresh = Engine::new();
        assert!(import_from_external(&mut fresh, &mut bytes.as_slice()).is_err());
    }

    #[test]
    fn forward_reference_is_rejected() {
        let mut engine = Engine::new();
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.extend_from_slice(&2u64.to_le_bytes());
        buf.extend_from_slice(&Arc::node(1, false).bits().to_le_bytes());
        // node 1 claims low = node 1 itself (not yet read): invalid.
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&Arc::node(1, false).bits().to_le_bytes());
        buf.extend_from_slice(&T1.bits().to_le_bytes());
        assert!(import_from_external(&mut engine, &mut buf.as_slice()).is_err());
    }
}
