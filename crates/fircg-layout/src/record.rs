use crate::{LowerError, LowerResult, TypeConverter};
use fircg_types::{IdentifiedStruct, PhysicalType, RecordType, StructBody};

impl TypeConverter {
    /// type<name{f: T...}> --> %name = { T... }
    ///
    /// The named identity is cached before the fields are converted, so a
    /// field that refers back to the record resolves to that identity.
    ///
    /// If a field fails, every identity reserved from this record onwards is
    /// evicted: records finished in the meantime may embed the body-less
    /// identity and must not be handed out.
    pub(crate) fn lower_record(&mut self, record: &RecordType) -> LowerResult<PhysicalType> {
        let name = record.name();
        if let Some(err) = self.record_errors.get(name) {
            return Err(err.clone());
        }
        if let Some(ident) = self.ident_struct_cache.get(name) {
            log::trace!("record {} resolved from cache", name);
            return Ok(ident.clone().into());
        }

        if !record.len_params().is_empty() {
            return Err(LowerError::UnimplementedExtension(format!(
                "length type parameters of derived type `{}`",
                name
            )));
        }
        let fields = record
            .fields()
            .ok_or_else(|| LowerError::IncompleteRecord(name.to_string()))?;

        let ident = IdentifiedStruct::opaque(name);
        let mark = self.reserved.len();
        self.ident_struct_cache.insert(name.to_string(), ident.clone());
        self.reserved.push(name.to_string());
        log::trace!("reserved struct identity for record {}", name);

        let mut members = Vec::with_capacity(fields.len());
        for (_, field_ty) in fields {
            match self.lower(field_ty) {
                Ok(member) => members.push(member),
                Err(err) => {
                    self.evict_reserved(mark);
                    self.record_errors.insert(name.to_string(), err.clone());
                    return Err(err);
                }
            }
        }

        // The identity was created above, so its body is still unset.
        let filled = ident.set_body(StructBody::new(members));
        debug_assert!(filled.is_ok(), "struct body of `{}` set twice", name);
        if mark == 0 {
            self.reserved.clear();
        }
        Ok(ident.into())
    }

    fn evict_reserved(&mut self, mark: usize) {
        for evicted in self.reserved.drain(mark..) {
            log::debug!("evicting record {} after a failed conversion", evicted);
            self.ident_struct_cache.remove(&evicted);
        }
    }

    /// The struct identity already bound to a record name, if any.
    pub fn record_struct(&self, name: &str) -> Option<&IdentifiedStruct> {
        self.ident_struct_cache.get(name)
    }
}

#[cfg(test)]
mod tests {
    use crate::{LowerError, TypeConverter};
    use fircg_target::TargetConfig;
    use fircg_types::{PhysicalType, RecordType, SourceType};

    fn converter() -> TypeConverter {
        TypeConverter::for_target(&TargetConfig::new("x86_64-unknown-linux-gnu")).unwrap()
    }

    #[test]
    fn plain_record_gets_named_struct() {
        let mut conv = converter();
        let point = RecordType::with_fields(
            "point",
            vec![("x".into(), SourceType::real(4)), ("y".into(), SourceType::real(4))],
        );
        let ty = conv.lower(&SourceType::record(&point)).unwrap();
        assert_eq!(ty.to_string(), "%point");
        assert_eq!(
            ty.struct_fields().unwrap().iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["float", "float"]
        );
        assert!(conv.record_struct("point").is_some());
    }

    #[test]
    fn self_reference_resolves_to_the_same_identity() {
        let mut conv = converter();
        let node = RecordType::declare("node");
        node.finalize(vec![
            ("value".into(), SourceType::integer(4)),
            ("next".into(), SourceType::pointer(SourceType::record(&node))),
        ])
        .unwrap();

        let ty = conv.lower(&SourceType::record(&node)).unwrap();
        let fields = ty.struct_fields().unwrap();
        assert_eq!(fields[1], PhysicalType::pointer_to(ty.clone()));
        let inner = fields[1].pointee().and_then(PhysicalType::as_identified).unwrap();
        assert!(inner.same_identity(ty.as_identified().unwrap()));
    }

    #[test]
    fn mutual_recursion_terminates() {
        let mut conv = converter();
        let a = RecordType::declare("a");
        let b = RecordType::declare("b");
        a.finalize(vec![("b".into(), SourceType::heap(SourceType::record(&b)))]).unwrap();
        b.finalize(vec![("a".into(), SourceType::pointer(SourceType::record(&a)))]).unwrap();

        let a_ty = conv.lower(&SourceType::record(&a)).unwrap();
        let b_ty = conv.lower(&SourceType::record(&b)).unwrap();
        assert_eq!(a_ty.struct_fields().unwrap()[0], PhysicalType::pointer_to(b_ty.clone()));
        assert_eq!(b_ty.struct_fields().unwrap()[0], PhysicalType::pointer_to(a_ty));
    }

    #[test]
    fn length_parameters_are_an_unimplemented_extension() {
        let mut conv = converter();
        let rec = RecordType::declare_with_len_params("t", vec![("n".into(), SourceType::integer(4))]);
        rec.finalize(vec![("c".into(), SourceType::dynamic_character(1))]).unwrap();
        assert!(matches!(
            conv.lower(&SourceType::record(&rec)),
            Err(LowerError::UnimplementedExtension(_))
        ));
    }

    #[test]
    fn missing_body_is_reported() {
        let mut conv = converter();
        let rec = RecordType::declare("ghost");
        assert_eq!(
            conv.lower(&SourceType::record(&rec)),
            Err(LowerError::IncompleteRecord("ghost".into()))
        );
    }

    #[test]
    fn failed_record_keeps_failing() {
        let mut conv = converter();
        let rec = RecordType::with_fields("bad", vec![("x".into(), SourceType::real(7))]);
        let first = conv.lower(&SourceType::record(&rec)).unwrap_err();
        let second = conv.lower(&SourceType::record(&rec)).unwrap_err();
        assert_eq!(first, second);
    }

    #[test]
    fn failure_evicts_records_finished_meanwhile() {
        let mut conv = converter();
        let a = RecordType::declare("a");
        let c = RecordType::declare("c");
        a.finalize(vec![
            ("c".into(), SourceType::pointer(SourceType::record(&c))),
            ("bad".into(), SourceType::polymorphic_box(SourceType::integer(4))),
        ])
        .unwrap();
        c.finalize(vec![("a".into(), SourceType::record(&a))]).unwrap();

        let err = conv.lower(&SourceType::record(&a)).unwrap_err();
        assert!(matches!(err, LowerError::UnimplementedExtension(_)));
        assert!(conv.record_struct("a").is_none());
        assert!(conv.record_struct("c").is_none());
        assert_eq!(conv.cached_record_count(), 0);

        assert_eq!(conv.lower(&SourceType::record(&c)), Err(err));
        assert!(conv.record_struct("c").is_none());
    }

    #[test]
    fn sibling_records_survive_an_unrelated_failure() {
        let mut conv = converter();
        let ok = RecordType::with_fields("ok", vec![("i".into(), SourceType::integer(4))]);
        let bad = RecordType::with_fields(
            "bad",
            vec![
                ("ok".into(), SourceType::record(&ok)),
                ("x".into(), SourceType::real(7)),
            ],
        );
        assert!(conv.lower(&SourceType::record(&bad)).is_err());
        assert!(conv.record_struct("ok").is_none());

        let ok_ty = conv.lower(&SourceType::record(&ok)).unwrap();
        assert_eq!(ok_ty.struct_fields().unwrap(), &[PhysicalType::int(32)]);
        assert!(conv.record_struct("ok").unwrap().same_identity(ok_ty.as_identified().unwrap()));
    }

    #[test]
    fn reservations_are_released_after_success() {
        let mut conv = converter();
        let inner = RecordType::with_fields("inner", vec![("i".into(), SourceType::integer(4))]);
        let outer = RecordType::with_fields("outer", vec![("inner".into(), SourceType::record(&inner))]);
        conv.lower(&SourceType::record(&outer)).unwrap();

        let bad = RecordType::with_fields(
            "later",
            vec![
                ("outer".into(), SourceType::record(&outer)),
                ("x".into(), SourceType::real(7)),
            ],
        );
        assert!(conv.lower(&SourceType::record(&bad)).is_err());
        assert!(conv.record_struct("outer").is_some());
        assert!(conv.record_struct("inner").is_some());
    }
}
