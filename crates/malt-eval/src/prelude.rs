/// Lisp-level definitions evaluated into the global env at startup.
/// These are built from special forms and builtins only.
pub const PRELUDE: &str = r#"
(def! *host-language* "malt")

(def! not (fn* (a) (if a false true)))

;; (cond test expr ...) => nested ifs, nil when nothing matches
(defmacro! cond
  (fn* (& xs)
    (if (> (count xs) 0)
      (list 'if (first xs)
            (if (> (count xs) 1)
              (nth xs 1)
              (throw "odd number of forms to cond"))
            (cons 'cond (rest (rest xs)))))))
"#;
