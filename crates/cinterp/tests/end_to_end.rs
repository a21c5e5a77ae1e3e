//! Exercises the canonical end-to-end scenarios against the public `Runner` API.

use cinterp::{CollectStringPrint, NoStdin, Runner};
use pretty_assertions::assert_eq;

fn run(src: &str) -> (i64, String) {
    let runner = Runner::new(src).expect("program must parse and analyze");
    let mut writer = CollectStringPrint::default();
    let mut stdin = NoStdin;
    let status = runner.run(&mut writer, &mut stdin, 0).expect("program must run");
    (status, writer.into_output())
}

#[test]
fn hello_world() {
    let (status, out) = run(r#"#include <stdio.h>
int main(){printf("Hello World!"); return 0;}"#);
    assert_eq!(out, "Hello World!");
    assert_eq!(status, 0);
}

#[test]
fn for_loop_break_accumulates_into_exit_status() {
    let (status, out) = run(
        r#"#include <stdio.h>
int main(){int i,j=0; for(i=0;i<5;i++){j+=i; if(j==6) break;} printf("%d",j); return j;}"#,
    );
    assert_eq!(out, "6");
    assert_eq!(status, 6);
}

#[test]
fn xor_of_two_and_three() {
    let (status, out) = run(r#"#include <stdio.h>
int main(){int a=2,b=3,c=a^b; printf("%d",c); return 0;}"#);
    assert_eq!(out, "1");
    assert_eq!(status, 0);
}

#[test]
fn pointer_write_is_visible_through_original_name() {
    let (status, out) = run(r#"#include <stdio.h>
int main(){int a; int* p=&a; *p=7; printf("%d",a); return 0;}"#);
    assert_eq!(out, "7");
    assert_eq!(status, 0);
}

#[test]
fn switch_dispatches_to_matching_case() {
    let (status, out) = run(
        r#"#include <stdio.h>
int main(){int i=4; switch(i+1){case 1: printf("A"); break; case 5: printf("B"); break; default: printf("D");} return 0;}"#,
    );
    assert_eq!(out, "B");
    assert_eq!(status, 0);
}

#[test]
fn struct_field_access_by_value_and_through_pointer() {
    let (status, out) = run(
        "#include <stdio.h>\nstruct S{int a,b;};\nint main(){struct S z; z.a=3; struct S* p=&z; p->b=4; printf(\"%d %d\",z.a,p->b); return 0;}",
    );
    assert_eq!(out, "3 4");
    assert_eq!(status, 0);
}
